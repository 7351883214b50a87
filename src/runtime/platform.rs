use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operating system family a driver binding is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Platform {
    #[display("windows")]
    Windows,
    #[display("linux")]
    Linux,
    #[display("macos")]
    MacOs,
    #[display("other")]
    Other,
}

impl Platform {
    /// The family of the operating system this process runs on.
    #[inline]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an operating system name as reported by [`std::env::consts::OS`] to its family.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform {0}: expected one of windows, linux, macos, other")]
pub struct ParsePlatformError(pub String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "osx" => Ok(Self::MacOs),
            "other" => Ok(Self::Other),
            _ => Err(ParsePlatformError(s.to_owned())),
        }
    }
}
