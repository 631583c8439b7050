//! Shared utilities.

mod decimal;

pub use decimal::{from_percentage, round_to_precision, to_decimal, to_percentage};
