//! Checkout quote handlers.
//!
//! A quote prices the requested items (or the current cart), resolves any
//! coupon code, asks the platform for the cheapest delivery rate, and returns
//! the composed summary. Nothing is written; order creation is a separate
//! call.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{AddressId, PaymentMethod, UserId};

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::services::coupons::{self, AppliedCoupon};
use crate::services::pricing::{self, ItemInput, PricedItem};
use crate::services::totals::{OrderSummary, derive_total};
use crate::state::AppState;

/// Request body for a checkout quote.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Explicit items; the current cart is used when omitted.
    pub items: Option<Vec<ItemInput>>,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub coupon_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

/// A composed checkout quote.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub items: Vec<PricedItem>,
    pub summary: OrderSummary,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    pub coupon: Option<AppliedCoupon>,
}

/// Quote a checkout from the request body (falling back to the cart).
///
/// # Errors
///
/// Returns 400 when there is nothing to check out or an item fails pricing
/// validation, 500-class errors when the platform is unreachable.
pub async fn quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let items = match body.items.take() {
        Some(items) if !items.is_empty() => items,
        _ => cart_as_items(&state, user.id).await?,
    };

    build_quote(&state, user.id, items, body).await.map(Json)
}

/// Re-quote the current cart.
///
/// # Errors
///
/// Returns 400 when the cart is empty, 500-class errors when the platform is
/// unreachable.
pub async fn quote_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CheckoutResponse>> {
    let items = cart_as_items(&state, user.id).await?;
    build_quote(&state, user.id, items, CheckoutRequest::default())
        .await
        .map(Json)
}

/// Load the caller's cart as pricing inputs.
async fn cart_as_items(state: &AppState, user_id: UserId) -> Result<Vec<ItemInput>> {
    let rows = state.platform().cart_items(user_id).await?;
    Ok(rows
        .into_iter()
        .map(|row| ItemInput {
            product_id: row.product_id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            price: None,
            price_cents: None,
        })
        .collect())
}

/// Price items, resolve the coupon, and compose the quote summary.
async fn build_quote(
    state: &AppState,
    user_id: UserId,
    items: Vec<ItemInput>,
    request: CheckoutRequest,
) -> Result<CheckoutResponse> {
    if items.is_empty() {
        return Err(AppError::BadRequest("No items to checkout".to_string()));
    }

    let priced = pricing::price_items(state.platform(), &items).await?;
    let subtotal: Decimal = priced.iter().map(|item| item.total_price).sum();

    let coupon = match request.coupon_code.as_deref() {
        Some(code) => coupons::quote_coupon(state.platform(), user_id, code, subtotal).await?,
        None => None,
    };

    // Delivery rate lookup is best-effort; a quote without shipping beats no
    // quote at all.
    let rate = match state.platform().cheapest_delivery_rate(None, subtotal).await {
        Ok(rate) => rate.unwrap_or(Decimal::ZERO),
        Err(e) => {
            tracing::warn!(error = %e, "Delivery rate lookup failed, quoting zero shipping");
            Decimal::ZERO
        }
    };
    let shipping_amount = effective_shipping(rate, coupon.as_ref());

    let discount_amount = coupon
        .as_ref()
        .map_or(Decimal::ZERO, |c| c.discount_amount);
    let tax_amount = Decimal::ZERO;

    Ok(CheckoutResponse {
        items: priced,
        summary: OrderSummary {
            subtotal,
            discount_amount,
            shipping_amount,
            tax_amount,
            total_amount: derive_total(subtotal, discount_amount, shipping_amount, tax_amount),
        },
        shipping_address_id: request.shipping_address_id,
        billing_address_id: request.billing_address_id,
        payment_method: request.payment_method.unwrap_or_default(),
        coupon,
    })
}

/// A free-shipping coupon waives the quoted delivery rate.
fn effective_shipping(rate: Decimal, coupon: Option<&AppliedCoupon>) -> Decimal {
    if coupon.is_some_and(|c| c.free_shipping) {
        Decimal::ZERO
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vendora_core::{CouponId, DiscountType};

    fn applied(free_shipping: bool) -> AppliedCoupon {
        AppliedCoupon {
            id: CouponId::new(Uuid::new_v4()),
            code: "SHIPFREE".to_string(),
            discount_type: if free_shipping {
                DiscountType::FreeShipping
            } else {
                DiscountType::Percentage
            },
            discount_amount: Decimal::ZERO,
            free_shipping,
        }
    }

    #[test]
    fn test_free_shipping_coupon_zeroes_rate() {
        let rate = Decimal::new(799, 2);
        assert_eq!(effective_shipping(rate, Some(&applied(true))), Decimal::ZERO);
    }

    #[test]
    fn test_other_coupons_keep_rate() {
        let rate = Decimal::new(799, 2);
        assert_eq!(effective_shipping(rate, Some(&applied(false))), rate);
        assert_eq!(effective_shipping(rate, None), rate);
    }
}
