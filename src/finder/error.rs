//! Error types for the pair finder.

use thiserror::Error;

/// Errors raised while constructing a [`PairFinder`](super::PairFinder).
///
/// A series too short to hold a pair is not an error; the scan simply
/// registers nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinderError {
    /// Penalty given as a slice that is neither a scalar nor an (entry, exit) pair
    #[error("Invalid penalty: expected 1 or 2 components, got {len}")]
    InvalidPenaltyArity { len: usize },

    /// Penalty component is NaN or infinite
    #[error("Invalid penalty: component {value} is not finite")]
    NonFinitePenalty { value: f64 },

    /// Series sample is NaN or infinite
    #[error("Invalid series: sample {index} is not finite ({value})")]
    NonFiniteSample { index: usize, value: f64 },
}

pub type Result<T> = std::result::Result<T, FinderError>;
