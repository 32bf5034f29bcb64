//! Order total calculation and client override merging.
//!
//! Clients may override any monetary component in either decimal-units or
//! integer-cents form; [`vendora_core::resolve_amount`] is the single point
//! that picks between the encodings. The subtotal override is trusted as-is
//! (no cross-check against computed line totals), matching how the platform
//! reconciles vendor-submitted orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{is_valid_amount, resolve_amount};

use crate::error::{AppError, Result};

/// Client-supplied monetary overrides, each in two possible encodings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonetaryOverrides {
    pub subtotal: Option<Decimal>,
    pub subtotal_cents: Option<i64>,
    pub discount_amount: Option<Decimal>,
    pub discount_amount_cents: Option<i64>,
    pub shipping_amount: Option<Decimal>,
    pub shipping_amount_cents: Option<i64>,
    pub tax_amount: Option<Decimal>,
    pub tax_amount_cents: Option<i64>,
    pub total_amount: Option<Decimal>,
    pub total_amount_cents: Option<i64>,
}

/// Monetary summary of an order or checkout quote.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Derive a grand total, floored at zero.
#[must_use]
pub fn derive_total(
    subtotal: Decimal,
    discount: Decimal,
    shipping: Decimal,
    tax: Decimal,
) -> Decimal {
    (subtotal - discount + shipping + tax).max(Decimal::ZERO)
}

/// Merge client overrides with computed line totals into an order summary.
///
/// The subtotal falls back to the computed sum of line totals; discount,
/// shipping, and tax default to zero; the grand total is derived unless the
/// client supplied one.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when any resolved amount is negative or
/// absurdly large.
pub fn compute_summary(
    computed_subtotal: Decimal,
    overrides: &MonetaryOverrides,
) -> Result<OrderSummary> {
    let subtotal = resolve_amount(overrides.subtotal, overrides.subtotal_cents)
        .unwrap_or(computed_subtotal);
    let discount_amount =
        resolve_amount(overrides.discount_amount, overrides.discount_amount_cents)
            .unwrap_or(Decimal::ZERO);
    let shipping_amount =
        resolve_amount(overrides.shipping_amount, overrides.shipping_amount_cents)
            .unwrap_or(Decimal::ZERO);
    let tax_amount =
        resolve_amount(overrides.tax_amount, overrides.tax_amount_cents).unwrap_or(Decimal::ZERO);

    let total_amount = resolve_amount(overrides.total_amount, overrides.total_amount_cents)
        .unwrap_or_else(|| derive_total(subtotal, discount_amount, shipping_amount, tax_amount));

    let summary = OrderSummary {
        subtotal,
        discount_amount,
        shipping_amount,
        tax_amount,
        total_amount,
    };

    let all_valid = [
        summary.subtotal,
        summary.discount_amount,
        summary.shipping_amount,
        summary.tax_amount,
        summary.total_amount,
    ]
    .into_iter()
    .all(is_valid_amount);

    if !all_valid {
        return Err(AppError::BadRequest("Invalid monetary values".to_string()));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn test_total_never_negative() {
        assert_eq!(
            derive_total(dec(1000, 2), dec(5000, 2), Decimal::ZERO, Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_total_formula() {
        // 100 - 10 + 7.50 + 2.50 = 100
        assert_eq!(
            derive_total(dec(10000, 2), dec(1000, 2), dec(750, 2), dec(250, 2)),
            dec(10000, 2)
        );
    }

    #[test]
    fn test_defaults_to_computed_subtotal() {
        let summary =
            compute_summary(dec(4999, 2), &MonetaryOverrides::default()).expect("summary");
        assert_eq!(summary.subtotal, dec(4999, 2));
        assert_eq!(summary.discount_amount, Decimal::ZERO);
        assert_eq!(summary.total_amount, dec(4999, 2));
    }

    #[test]
    fn test_subtotal_override_is_trusted() {
        let overrides = MonetaryOverrides {
            subtotal: Some(dec(1, 0)),
            ..Default::default()
        };
        let summary = compute_summary(dec(10000, 2), &overrides).expect("summary");
        assert_eq!(summary.subtotal, dec(1, 0));
        assert_eq!(summary.total_amount, dec(1, 0));
    }

    #[test]
    fn test_total_cents_override() {
        // total_amount_cents: 15000 and no total_amount -> $150.00
        let overrides = MonetaryOverrides {
            total_amount_cents: Some(15000),
            ..Default::default()
        };
        let summary = compute_summary(dec(9999, 2), &overrides).expect("summary");
        assert_eq!(summary.total_amount.to_string(), "150.00");
    }

    #[test]
    fn test_cents_beat_units_per_field() {
        let overrides = MonetaryOverrides {
            shipping_amount: Some(dec(999, 2)),
            shipping_amount_cents: Some(500),
            ..Default::default()
        };
        let summary = compute_summary(dec(10000, 2), &overrides).expect("summary");
        assert_eq!(summary.shipping_amount, dec(500, 2));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let overrides = MonetaryOverrides {
            discount_amount: Some(dec(-100, 2)),
            ..Default::default()
        };
        let err = compute_summary(dec(10000, 2), &overrides).expect_err("rejected");
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid monetary values"));
    }

    #[test]
    fn test_oversized_amount_rejected() {
        let overrides = MonetaryOverrides {
            subtotal_cents: Some(i64::MAX),
            ..Default::default()
        };
        assert!(compute_summary(Decimal::ZERO, &overrides).is_err());
    }

    #[test]
    fn test_derived_total_floors_at_zero_with_overrides() {
        let overrides = MonetaryOverrides {
            discount_amount: Some(dec(20000, 2)),
            ..Default::default()
        };
        let summary = compute_summary(dec(10000, 2), &overrides).expect("summary");
        assert_eq!(summary.total_amount, Decimal::ZERO);
    }
}
