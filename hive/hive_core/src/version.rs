//! Build metadata reported by `--version`.

use serde::Serialize;
use std::fmt;

/// Name, version and build profile of a binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// Package name.
    pub name: &'static str,

    /// Package version.
    pub version: &'static str,

    /// `debug` or `release`.
    pub profile: &'static str,
}

impl VersionInfo {
    /// Version info for a package, with the profile of the current build.
    pub const fn new(name: &'static str, version: &'static str) -> Self {
        Self {
            name,
            version,
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }

    /// Version info of this crate.
    pub const fn core() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.profile)
    }
}
