//! Order creation and history handlers.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{AddressId, PaymentMethod};

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::platform::types::{OrderRow, OrderWithDetails};
use crate::services::orders::{OrderDraft, persist_order};
use crate::services::pricing::{self, ItemInput};
use crate::services::totals::{MonetaryOverrides, compute_summary};
use crate::state::AppState;

/// Request body for order creation.
///
/// Monetary overrides are accepted in both decimal-units and integer-cents
/// encodings; see [`MonetaryOverrides`].
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Option<Vec<ItemInput>>,
    #[serde(flatten)]
    pub overrides: MonetaryOverrides,
    pub coupon_code: Option<String>,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_method: Option<PaymentMethod>,
}

/// Response for order creation.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderRow,
}

/// Response for the order history listing.
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderWithDetails>,
}

/// Create an order with its items, payment stub, and delivery stub.
///
/// # Errors
///
/// Returns 400 for an empty item list, invalid quantities, unresolvable
/// prices, or out-of-range monetary overrides; 500-class errors when the
/// order or item insert fails.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>)> {
    let items = body.items.unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }

    let priced = pricing::price_items(state.platform(), &items).await?;
    let computed_subtotal: Decimal = priced.iter().map(|item| item.total_price).sum();
    let summary = compute_summary(computed_subtotal, &body.overrides)?;

    let order = persist_order(
        state.platform(),
        user.id,
        OrderDraft {
            items: priced,
            summary,
            coupon_code: body.coupon_code,
            shipping_address_id: body.shipping_address_id,
            billing_address_id: body.billing_address_id,
            payment_method: body.payment_method.unwrap_or_default(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CreateOrderResponse { order })))
}

/// List the caller's orders with nested items, payments, and deliveries.
///
/// # Errors
///
/// Returns 500-class errors when the platform lookup fails.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ListOrdersResponse>> {
    let orders = state.platform().orders_with_details(user.id).await?;
    Ok(Json(ListOrdersResponse { orders }))
}
