use std::io;

use thiserror::Error;

/// The single error type propagated from the input parser up to the
/// command-line front end. Every fallible operation in this workspace
/// returns a `Gr1Error` (or a type convertible into one via `?`).
#[derive(Error, Debug)]
pub enum Gr1Error {
    /// A catch-all for ad-hoc messages, mirroring how the original tool
    /// reports malformed invocations.
    #[error("{0}")]
    Message(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A specification file line could not be parsed. Line numbers are
    /// 1-based, matching the convention of the input format.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The formula was syntactically fine but referenced a variable with
    /// the wrong type, reused a name, or referenced an unknown identifier.
    #[error("semantic error at line {line}: {message}")]
    Semantic { line: usize, message: String },

    /// An internal invariant that should always hold did not. These
    /// indicate a bug in the synthesis engine, never a bad input.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// The BDD manager could not allocate a new node.
    #[error("BDD manager ran out of memory: {0}")]
    ResourceExhausted(String),
}

impl From<&str> for Gr1Error {
    fn from(message: &str) -> Self {
        Gr1Error::Message(message.to_string())
    }
}

impl From<String> for Gr1Error {
    fn from(message: String) -> Self {
        Gr1Error::Message(message)
    }
}

impl From<oxidd_core::util::OutOfMemory> for Gr1Error {
    fn from(_: oxidd_core::util::OutOfMemory) -> Self {
        Gr1Error::ResourceExhausted("node table exhausted".to_string())
    }
}
