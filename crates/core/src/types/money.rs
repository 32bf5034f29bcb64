//! Monetary amount parsing shared across request handlers.
//!
//! Clients may send each monetary field in one of two encodings: decimal
//! units (`"subtotal": 19.99`) or integer cents (`"subtotal_cents": 1999`).
//! [`resolve_amount`] is the single conversion point; every handler goes
//! through it so a field is never interpreted twice.

use rust_decimal::Decimal;

/// Upper bound accepted for any single monetary amount, in units.
///
/// Amounts outside `[0, MAX_AMOUNT]` fail request validation.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Convert an integer cents value to a decimal units amount.
#[must_use]
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Resolve a client-supplied monetary field from its two possible encodings.
///
/// Cents win when both are present; the units value is used otherwise.
/// Returns `None` when the client supplied neither.
#[must_use]
pub fn resolve_amount(units: Option<Decimal>, cents: Option<i64>) -> Option<Decimal> {
    match (units, cents) {
        (_, Some(c)) => Some(cents_to_decimal(c)),
        (Some(u), None) => Some(u),
        (None, None) => None,
    }
}

/// Whether an amount is acceptable as a monetary input.
#[must_use]
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount >= Decimal::ZERO && amount <= MAX_AMOUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(15000), Decimal::new(150, 0));
        assert_eq!(cents_to_decimal(1999), Decimal::new(1999, 2));
        assert_eq!(cents_to_decimal(0), Decimal::ZERO);
    }

    #[test]
    fn test_resolve_prefers_cents() {
        // 2.50 units vs 150 cents: cents win
        let resolved = resolve_amount(Some(Decimal::new(25, 1)), Some(150));
        assert_eq!(resolved, Some(Decimal::new(150, 2)));
    }

    #[test]
    fn test_resolve_falls_back_to_units() {
        let resolved = resolve_amount(Some(Decimal::new(1999, 2)), None);
        assert_eq!(resolved, Some(Decimal::new(1999, 2)));
    }

    #[test]
    fn test_resolve_none_when_absent() {
        assert_eq!(resolve_amount(None, None), None);
    }

    #[test]
    fn test_total_cents_scenario() {
        // total_amount_cents: 15000 with no total_amount resolves to $150.00
        let resolved = resolve_amount(None, Some(15000)).expect("resolved");
        assert_eq!(resolved.to_string(), "150.00");
    }

    #[test]
    fn test_amount_bounds() {
        assert!(is_valid_amount(Decimal::ZERO));
        assert!(is_valid_amount(Decimal::new(9999, 2)));
        assert!(is_valid_amount(MAX_AMOUNT));
        assert!(!is_valid_amount(Decimal::new(-1, 2)));
        assert!(!is_valid_amount(MAX_AMOUNT + Decimal::ONE));
    }
}
