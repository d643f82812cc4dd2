//! Fixed-point money arithmetic.
//!
//! All monetary values carry exactly 2 fraction digits. Arithmetic runs
//! on `rust_decimal::Decimal`; the storage layer persists integer cents
//! so SUM/AVG aggregates stay exact. Tie-breaks round half-to-even.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 fraction digits, half-to-even.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Convert a monetary value to integer cents. `None` if the value does
/// not fit in an `i64` after scaling.
pub fn to_cents(value: Decimal) -> Option<i64> {
    (round2(value) * Decimal::ONE_HUNDRED).to_i64()
}

/// Convert integer cents back to a 2-digit decimal.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Coerce a CSV amount field to a non-negative decimal. Unparseable or
/// negative input coerces to zero.
pub fn parse_amount(raw: &str) -> Decimal {
    match raw.trim().parse::<Decimal>() {
        Ok(value) if value >= Decimal::ZERO => value,
        _ => Decimal::ZERO,
    }
}
