//! Conversions between gold amounts and the float domain.
//!
//! Gold stays in [`Decimal`] everywhere it is stored. Ratios against
//! morale-scale quantities are computed in `f64` and converted back here,
//! rounded to cents.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Decimal places kept when converting a float back to gold.
const GOLD_SCALE: u32 = 2;

/// Gold amount as a float; 0 if it cannot be represented.
pub(crate) fn to_f64(gold: Decimal) -> f64 {
    gold.to_f64().unwrap_or(0.0)
}

/// Float amount as gold rounded to cents; non-finite or negative input is 0.
pub(crate) fn from_f64(value: f64) -> Decimal {
    if !value.is_finite() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp(GOLD_SCALE))
        .unwrap_or(Decimal::ZERO)
}

/// Multiply gold by a factor, saturating to the input on overflow.
pub(crate) fn scale(gold: Decimal, factor: Decimal) -> Decimal {
    gold.checked_mul(factor).unwrap_or(gold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn float_conversion_rounds_to_cents() {
        assert_eq!(from_f64(123.456), dec!(123.46));
        assert_eq!(from_f64(f64::NAN), Decimal::ZERO);
        assert_eq!(from_f64(-5.0), Decimal::ZERO);
        assert!((to_f64(dec!(12.5)) - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn scale_is_exact() {
        assert_eq!(scale(dec!(500), dec!(1.05)), dec!(525.00));
    }
}
