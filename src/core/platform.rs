//! Operating system identification.
//!
//! Every toolchain decision in nativemod branches on exactly one value: the
//! [`Os`] the build runs on. It is passed explicitly, never read from `cfg!`,
//! so any platform can be selected from any host.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system families nativemod knows how to build for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows
    Windows,
    /// Linux
    Linux,
    /// macOS
    #[serde(alias = "macos")]
    Darwin,
    /// Anything else (BSDs, illumos, ...)
    Other,
}

impl Os {
    /// Detect the host operating system.
    pub fn host() -> Self {
        Os::from_identifier(std::env::consts::OS)
    }

    /// Map an operating system identifier to an [`Os`].
    ///
    /// Accepts both Rust's `std::env::consts::OS` spelling (`windows`,
    /// `linux`, `macos`) and the `uname`-style spelling (`Windows`, `Linux`,
    /// `Darwin`). Unknown identifiers map to [`Os::Other`].
    pub fn from_identifier(id: &str) -> Self {
        match id.to_ascii_lowercase().as_str() {
            "windows" => Os::Windows,
            "linux" => Os::Linux,
            "darwin" | "macos" => Os::Darwin,
            _ => Os::Other,
        }
    }

    /// Get the identifier as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Other => "other",
        }
    }

    /// Extension of shared libraries produced by the C path.
    pub fn shared_lib_extension(&self) -> &'static str {
        match self {
            Os::Windows => "dll",
            _ => "so",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Os::Windows)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Os::Windows),
            "linux" => Ok(Os::Linux),
            "darwin" | "macos" => Ok(Os::Darwin),
            "other" => Ok(Os::Other),
            _ => Err(format!(
                "invalid operating system '{}'; expected 'windows', 'linux', 'darwin', or 'other'",
                s
            )),
        }
    }
}
