use std::fmt;

use clap::Args;

/// Prints the crate version and exits, mirroring `--version` handling of the
/// other workspace binaries without pulling in clap's built-in version flag
/// (which does not compose well with `arg_required_else_help`).
#[derive(Args, Debug)]
pub struct VersionFlag {
    #[arg(long, help = "Print version information and exit")]
    version: bool,
}

impl From<VersionFlag> for bool {
    fn from(flag: VersionFlag) -> Self {
        flag.version
    }
}

/// The package version baked in at compile time.
pub struct Version;

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gr1 {}", env!("CARGO_PKG_VERSION"))
    }
}
