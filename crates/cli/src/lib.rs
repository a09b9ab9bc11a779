//! Command-line flags shared by every binary in the workspace.

#![forbid(unsafe_code)]

mod verbosity;
mod version;

pub use verbosity::*;
pub use version::*;
