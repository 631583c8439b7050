//! Transaction penalty applied on opt-in and opt-out.

use super::error::{FinderError, Result};
use serde::{Deserialize, Serialize};

/// Fractional cost charged on each side of a trade.
///
/// Deserializes from either a bare number (`0.0025`) or a two-element
/// `[entry, exit]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PenaltyRepr", into = "PenaltyRepr")]
pub enum Penalty {
    /// Same fraction charged on entry and exit
    Symmetric(f64),
    /// Distinct entry and exit fractions
    Asymmetric { entry: f64, exit: f64 },
}

impl Penalty {
    /// Create a symmetric penalty.
    pub fn symmetric(value: f64) -> Result<Self> {
        check_finite(value)?;
        Ok(Self::Symmetric(value))
    }

    /// Create an asymmetric penalty. Collapses to symmetric when both sides match.
    pub fn asymmetric(entry: f64, exit: f64) -> Result<Self> {
        check_finite(entry)?;
        check_finite(exit)?;
        if entry == exit {
            Ok(Self::Symmetric(entry))
        } else {
            Ok(Self::Asymmetric { entry, exit })
        }
    }

    /// Check both sides are finite.
    pub fn validate(&self) -> Result<()> {
        check_finite(self.entry())?;
        check_finite(self.exit())
    }

    /// Fraction charged when opting in.
    pub fn entry(&self) -> f64 {
        match *self {
            Self::Symmetric(p) => p,
            Self::Asymmetric { entry, .. } => entry,
        }
    }

    /// Fraction charged when opting out.
    pub fn exit(&self) -> f64 {
        match *self {
            Self::Symmetric(p) => p,
            Self::Asymmetric { exit, .. } => exit,
        }
    }

    /// Net proceeds of buying at `entry_value` and selling at `exit_value`.
    pub fn net_gain(&self, entry_value: f64, exit_value: f64) -> f64 {
        (1.0 - self.exit()) * exit_value - (1.0 + self.entry()) * entry_value
    }

    /// Gain from selling at `current` and buying back at `intermediate`,
    /// paying the exit penalty on the sale and the entry penalty on the rebuy.
    ///
    /// For a symmetric penalty this is `current - intermediate - p * (current + intermediate)`.
    pub fn split_gain(&self, current: f64, intermediate: f64) -> f64 {
        current - intermediate - self.exit() * current - self.entry() * intermediate
    }
}

impl Default for Penalty {
    fn default() -> Self {
        Self::Symmetric(0.0025)
    }
}

impl TryFrom<f64> for Penalty {
    type Error = FinderError;

    fn try_from(value: f64) -> Result<Self> {
        Self::symmetric(value)
    }
}

impl TryFrom<(f64, f64)> for Penalty {
    type Error = FinderError;

    fn try_from((entry, exit): (f64, f64)) -> Result<Self> {
        Self::asymmetric(entry, exit)
    }
}

impl TryFrom<&[f64]> for Penalty {
    type Error = FinderError;

    fn try_from(components: &[f64]) -> Result<Self> {
        match *components {
            [p] => Self::symmetric(p),
            [entry, exit] => Self::asymmetric(entry, exit),
            _ => Err(FinderError::InvalidPenaltyArity {
                len: components.len(),
            }),
        }
    }
}

fn check_finite(value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FinderError::NonFinitePenalty { value })
    }
}

/// Wire shape of a penalty in config files and JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PenaltyRepr {
    Scalar(f64),
    Components(Vec<f64>),
}

impl TryFrom<PenaltyRepr> for Penalty {
    type Error = FinderError;

    fn try_from(repr: PenaltyRepr) -> Result<Self> {
        match repr {
            PenaltyRepr::Scalar(p) => Self::symmetric(p),
            PenaltyRepr::Components(components) => Self::try_from(components.as_slice()),
        }
    }
}

impl From<Penalty> for PenaltyRepr {
    fn from(penalty: Penalty) -> Self {
        match penalty {
            Penalty::Symmetric(p) => PenaltyRepr::Scalar(p),
            Penalty::Asymmetric { entry, exit } => PenaltyRepr::Components(vec![entry, exit]),
        }
    }
}
