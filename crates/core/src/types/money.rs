//! Money conversion between decimal major units and integer minor units.
//!
//! The payment gateway expects amounts in the smallest currency unit
//! (integer cents for USD) while the collection store and the metadata bag
//! carry decimal major units. All conversions go through this module so the
//! rounding rule lives in exactly one place.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Errors that can occur when converting money amounts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MoneyError {
    /// The amount is negative where a non-negative amount is required.
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in the integer cents representation.
    #[error("amount out of range for minor units: {0}")]
    OutOfRange(Decimal),
}

/// Convert a decimal major-unit amount to integer cents.
///
/// Rounding is half-up on exact `.5` cent boundaries (away from zero), which
/// matches what the gateway documents for unit amounts.
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for negative amounts and
/// [`MoneyError::OutOfRange`] if the result does not fit in `i64`.
pub fn to_cents(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }

    let cents = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    cents.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

/// Convert integer cents back to a decimal major-unit amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_to_cents_exact() {
        assert_eq!(to_cents(dec("9.99")).unwrap(), 999);
        assert_eq!(to_cents(dec("0")).unwrap(), 0);
        assert_eq!(to_cents(dec("125")).unwrap(), 12500);
    }

    #[test]
    fn test_to_cents_half_up() {
        // Exact .5 cent boundaries round away from zero
        assert_eq!(to_cents(dec("0.125")).unwrap(), 13);
        assert_eq!(to_cents(dec("19.995")).unwrap(), 2000);
    }

    #[test]
    fn test_to_cents_below_half_rounds_down() {
        assert_eq!(to_cents(dec("0.124")).unwrap(), 12);
    }

    #[test]
    fn test_to_cents_rejects_negative() {
        assert!(matches!(
            to_cents(dec("-1.00")),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(from_cents(2498), dec("24.98"));
        assert_eq!(from_cents(0), dec("0.00"));
        assert_eq!(from_cents(500), dec("5.00"));
    }

    #[test]
    fn test_roundtrip() {
        let amount = dec("19.98");
        assert_eq!(from_cents(to_cents(amount).unwrap()), amount);
    }
}
