use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compute capability of a CUDA device.
///
/// Ordered by `major`, then `minor`, so a newer architecture compares greater.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display("SM_{major}{minor}")]
pub struct CudaArchitecture {
    pub major: u32,
    pub minor: u32,
}

impl CudaArchitecture {
    pub const SM_30: Self = Self::new(3, 0);
    pub const SM_32: Self = Self::new(3, 2);
    pub const SM_35: Self = Self::new(3, 5);
    pub const SM_37: Self = Self::new(3, 7);
    pub const SM_50: Self = Self::new(5, 0);
    pub const SM_52: Self = Self::new(5, 2);
    pub const SM_53: Self = Self::new(5, 3);
    pub const SM_60: Self = Self::new(6, 0);
    pub const SM_61: Self = Self::new(6, 1);
    pub const SM_62: Self = Self::new(6, 2);
    pub const SM_70: Self = Self::new(7, 0);
    pub const SM_72: Self = Self::new(7, 2);
    pub const SM_75: Self = Self::new(7, 5);
    pub const SM_80: Self = Self::new(8, 0);
    pub const SM_86: Self = Self::new(8, 6);
    pub const SM_87: Self = Self::new(8, 7);
    pub const SM_89: Self = Self::new(8, 9);
    pub const SM_90: Self = Self::new(9, 0);

    #[inline]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cuda architecture {0}: expected `SM_xy` or `x.y`")]
pub struct ParseArchitectureError(pub String);

impl FromStr for CudaArchitecture {
    type Err = ParseArchitectureError;

    /// Parses `SM_86`, `sm_86`, `compute_86` or `8.6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseArchitectureError(s.to_owned());
        let s = s.trim();
        if let Some((major, minor)) = s.split_once('.') {
            let major = major.parse().map_err(|_| err())?;
            let minor = minor.parse().map_err(|_| err())?;
            return Ok(Self::new(major, minor));
        }

        let lower = s.to_ascii_lowercase();
        let digits = lower
            .strip_prefix("sm_")
            .or_else(|| lower.strip_prefix("compute_"))
            .ok_or_else(err)?;
        if digits.len() < 2 || !digits.bytes().all(|x| x.is_ascii_digit()) {
            return Err(err());
        }
        let (major, minor) = digits.split_at(digits.len() - 1);
        let major = major.parse().map_err(|_| err())?;
        let minor = minor.parse().map_err(|_| err())?;
        Ok(Self::new(major, minor))
    }
}
