use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

///
/// Storage width of the scores held by a bin list. Affects only how
/// scores are rounded when a new list is built, never how an operation
/// computes.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Precision {
    /// Scores round-trip through `f32` when a list is built
    #[default]
    Bit32,
    /// Full `f64` scores
    Bit64,
}

impl Precision {
    /// Round `value` to this storage width.
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            Precision::Bit32 => value as f32 as f64,
            Precision::Bit64 => value,
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "32" | "32bit" | "32-bit" => Ok(Precision::Bit32),
            "64" | "64bit" | "64-bit" => Ok(Precision::Bit64),
            _ => Err(format!("Invalid precision: {}", s)),
        }
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Bit32 => write!(f, "32-bit"),
            Precision::Bit64 => write!(f, "64-bit"),
        }
    }
}
