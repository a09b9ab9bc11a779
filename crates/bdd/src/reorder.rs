use std::cell::Cell;

/// Tracks whether dynamic variable reordering is currently permitted.
///
/// The manager itself performs no automatic reordering in this
/// implementation (oxidd's reordering hooks are not wired up here); what
/// this flag gives the rest of the pipeline is a *contract*: the extractors
/// must freeze reordering before using a BDD's hash code as a map key,
/// because reordering would otherwise invalidate that key. Freezing here is
/// the single place that promise is recorded and asserted.
pub struct ReorderPolicy {
    enabled: Cell<bool>,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        ReorderPolicy { enabled: Cell::new(true) }
    }
}

impl ReorderPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Disables reordering. Called before strategy extraction begins.
    pub fn disable(&self) {
        self.enabled.set(false);
    }

    pub fn enable(&self) {
        self.enabled.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_enabled_and_can_be_frozen() {
        let policy = ReorderPolicy::new();
        assert!(policy.is_enabled());

        policy.disable();
        assert!(!policy.is_enabled());
    }
}
