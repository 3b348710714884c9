//! Property-based tests for the decimal rounder (§8 "decimal idempotence").

use proptest::prelude::*;
use rust_decimal::Decimal;

use barkernel_core::precision::round_decimal;

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64, 0u32..9u32)
        .prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn rounding_is_idempotent(value in arb_decimal(), precision in 0u32..8u32) {
        let once = round_decimal(value, precision);
        let twice = round_decimal(once, precision);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rounding_truncates_toward_zero(value in arb_decimal(), precision in 0u32..8u32) {
        let rounded = round_decimal(value, precision);
        if value >= Decimal::ZERO {
            prop_assert!(rounded <= value);
        } else {
            prop_assert!(rounded >= value);
        }
    }

    #[test]
    fn rounding_never_exceeds_requested_scale(value in arb_decimal(), precision in 0u32..8u32) {
        let rounded = round_decimal(value, precision);
        prop_assert!(rounded.scale() <= precision);
    }
}
