//! Decimal conversions for reported gains.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Convert a sample-space value to `Decimal`, mapping non-finite input to zero.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
}

/// Round a decimal to a specific number of decimal places.
pub fn round_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp(decimals)
}

/// Fraction to percent (0.0125 -> 1.25).
pub fn to_percentage(rate: Decimal) -> Decimal {
    rate * dec!(100)
}

/// Percent to fraction (1.25 -> 0.0125).
pub fn from_percentage(pct: Decimal) -> Decimal {
    pct / dec!(100)
}
