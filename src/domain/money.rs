//! Monetary types for price and volume representation.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Volume (base-asset quantity) represented as a Decimal for precision.
pub type Volume = Decimal;

/// Convert a decimal to `f64` for statistical work, defaulting to zero.
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Convert an `f64` back to a decimal, mapping non-finite values to zero.
#[must_use]
pub fn from_f64(value: f64) -> Decimal {
    if value.is_finite() {
        Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}
