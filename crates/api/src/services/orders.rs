//! Best-effort order persistence.
//!
//! The platform has no cross-table transaction surface, so order creation is
//! a sequence of independent inserts. The order and its items must land;
//! the payment and delivery stubs are best-effort and a failure there is
//! logged rather than surfaced. Partial rows are reconciled by platform-side
//! maintenance jobs.

use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

use vendora_core::{
    AddressId, DeliveryStatus, OrderStatus, PaymentMethod, PaymentStatus, UserId,
};

use crate::error::Result;
use crate::platform::PlatformClient;
use crate::platform::types::{NewDelivery, NewOrder, NewOrderItem, NewPayment, OrderRow};
use crate::services::pricing::PricedItem;
use crate::services::totals::OrderSummary;

/// Days until the synthesized delivery estimate.
const DELIVERY_ETA_DAYS: i64 = 7;

/// Everything needed to persist an order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub items: Vec<PricedItem>,
    pub summary: OrderSummary,
    pub coupon_code: Option<String>,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
}

/// Synthesize an order number: `ORD-` + epoch millis + 4 random characters.
fn generate_order_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!(
        "ORD-{}-{}",
        Utc::now().timestamp_millis(),
        suffix.to_uppercase()
    )
}

/// Synthesize a tracking number: `VND-` + 10 random characters.
fn generate_tracking_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("VND-{}", suffix.to_uppercase())
}

/// Persist an order with its items, payment stub, and delivery stub.
///
/// The order and item inserts are fatal on failure. The payment insert, the
/// cash-on-delivery paid flip, and the delivery insert are not: the order is
/// returned even when they fail.
///
/// # Errors
///
/// Returns `AppError::Platform` when the order or item insert fails.
pub async fn persist_order(
    platform: &PlatformClient,
    user_id: UserId,
    draft: OrderDraft,
) -> Result<OrderRow> {
    let order = platform
        .insert_order(&NewOrder {
            user_id,
            order_number: generate_order_number(),
            status: OrderStatus::Pending,
            subtotal: draft.summary.subtotal,
            discount_amount: draft.summary.discount_amount,
            shipping_amount: draft.summary.shipping_amount,
            tax_amount: draft.summary.tax_amount,
            total_amount: draft.summary.total_amount,
            coupon_code: draft.coupon_code,
            shipping_address_id: draft.shipping_address_id,
            billing_address_id: draft.billing_address_id,
            payment_method: draft.payment_method,
        })
        .await?;

    let items: Vec<NewOrderItem> = draft
        .items
        .into_iter()
        .map(|item| NewOrderItem {
            order_id: order.id,
            product_id: item.product_id,
            variant_id: item.variant_id,
            product_name: item.product_name,
            sku: item.sku,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
        })
        .collect();
    platform.insert_order_items(&items).await?;

    // Payment stub. Cash-on-delivery flips straight to paid so the platform
    // triggers run commission calculation at order time.
    match platform
        .insert_payment(&NewPayment {
            order_id: order.id,
            amount: order.total_amount,
            payment_method: draft.payment_method,
            status: PaymentStatus::Pending,
        })
        .await
    {
        Ok(payment) => {
            if draft.payment_method.is_cash_on_delivery() {
                if let Err(e) = platform.mark_payment_paid(payment.id).await {
                    tracing::warn!(
                        error = %e,
                        order_id = %order.id,
                        "Failed to mark cash-on-delivery payment paid"
                    );
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, order_id = %order.id, "Payment insert failed");
        }
    }

    // Delivery stub with a synthesized tracking number.
    if let Err(e) = platform
        .insert_delivery(&NewDelivery {
            order_id: order.id,
            status: DeliveryStatus::Pending,
            tracking_number: generate_tracking_number(),
            estimated_delivery_date: Utc::now() + Duration::days(DELIVERY_ETA_DAYS),
        })
        .await
    {
        tracing::warn!(error = %e, order_id = %order.id, "Delivery insert failed");
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_number_shape() {
        let tracking = generate_tracking_number();
        let suffix = tracking.strip_prefix("VND-").expect("prefix");
        assert_eq!(suffix.len(), 10);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number();
        let rest = number.strip_prefix("ORD-").expect("prefix");
        let (millis, suffix) = rest.split_once('-').expect("two segments");
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 4);
    }

    #[test]
    fn test_tracking_numbers_are_unique_enough() {
        let a = generate_tracking_number();
        let b = generate_tracking_number();
        assert_ne!(a, b);
    }
}
