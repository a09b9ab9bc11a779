use std::io::BufRead;

/// Iterates the lines of a reader paired with their 1-based line number,
/// matching the numbering used in parse error messages.
pub struct LineIterator<R> {
    reader: R,
    next_line: usize,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        LineIterator { reader, next_line: 1 }
    }
}

impl<R: BufRead> Iterator for LineIterator<R> {
    type Item = std::io::Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let number = self.next_line;
                self.next_line += 1;

                // Strip the trailing newline, keep everything else verbatim.
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(Ok((number, line)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers() {
        let input = "first\nsecond\nthird";
        let mut it = LineIterator::new(input.as_bytes());

        assert_eq!(it.next().unwrap().unwrap(), (1, "first".to_string()));
        assert_eq!(it.next().unwrap().unwrap(), (2, "second".to_string()));
        assert_eq!(it.next().unwrap().unwrap(), (3, "third".to_string()));
        assert!(it.next().is_none());
    }
}
