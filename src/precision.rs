//! Decimal precision module for barkernel-core.
//!
//! This module provides:
//! - `round_decimal()` — truncate-toward-zero rounding to a configured number of fractional digits
//! - `PRICE_EPSILON` / `QUANTITY_EPSILON` constants for approximate comparisons used in tests
//! - `approx_eq()` / `price_eq()` / `quantity_eq()` helpers

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Price comparison epsilon, used only in tests and diagnostics.
pub const PRICE_EPSILON: f64 = 1e-9;

/// Quantity comparison epsilon, used only in tests and diagnostics.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Approximate equality comparison for floating-point diagnostics.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[inline]
pub fn price_eq(a: f64, b: f64) -> bool {
    approx_eq(a, b, PRICE_EPSILON)
}

#[inline]
pub fn quantity_eq(a: f64, b: f64) -> bool {
    approx_eq(a, b, QUANTITY_EPSILON)
}

/// Truncate `value` toward zero at `precision` fractional digits.
///
/// Unlike `Decimal::round_dp`, which rounds half-up by default, the gateway needs
/// truncation: 1.95 at precision 1 must become 1.9, not 2.0.
pub fn round_decimal(value: Decimal, precision: u32) -> Decimal {
    value.round_dp_with_strategy(precision, RoundingStrategy::ToZero)
}
