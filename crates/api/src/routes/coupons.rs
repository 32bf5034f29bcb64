//! Coupon listing and redemption handlers.
//!
//! The listing quietly filters out anything the caller cannot use; the
//! redemption endpoint is strict and surfaces exactly why a coupon was
//! refused.

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{BrandId, CategoryId, CouponId, OrderId, ProductId, VendorId};

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::platform::types::{CouponScope, DiscountUsageRow, NewDiscountUsage};
use crate::services::coupons::{self, ValidCoupon};
use crate::state::AppState;

/// Scope filters for the coupon listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListCouponsQuery {
    pub vendor_id: Option<VendorId>,
    pub product_id: Option<ProductId>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
}

/// Response for the coupon listing.
#[derive(Debug, Serialize)]
pub struct ListCouponsResponse {
    pub coupons: Vec<ValidCoupon>,
}

/// Request body for recording a redemption.
#[derive(Debug, Deserialize)]
pub struct TrackCouponRequest {
    pub coupon_id: Option<CouponId>,
    pub order_id: Option<OrderId>,
    pub discount_amount: Option<Decimal>,
}

/// Response for a recorded redemption.
#[derive(Debug, Serialize)]
pub struct TrackCouponResponse {
    pub success: bool,
    pub usage: DiscountUsageRow,
}

/// List the coupons currently valid for the caller.
///
/// # Errors
///
/// Returns 500-class errors when a platform lookup fails.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListCouponsQuery>,
) -> Result<Json<ListCouponsResponse>> {
    let scope = CouponScope {
        vendor_id: query.vendor_id,
        product_id: query.product_id,
        category_id: query.category_id,
        brand_id: query.brand_id,
    };

    let coupons = coupons::list_valid_coupons(state.platform(), user.id, scope).await?;
    Ok(Json(ListCouponsResponse { coupons }))
}

/// Record a coupon redemption against an order.
///
/// # Errors
///
/// Returns 400 for a missing `coupon_id` or a failed validation rule, 404
/// for an unknown coupon or order, and 500-class errors when the usage
/// insert fails.
pub async fn track(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<TrackCouponRequest>,
) -> Result<Json<TrackCouponResponse>> {
    let coupon_id = body
        .coupon_id
        .ok_or_else(|| AppError::BadRequest("coupon_id is required".to_string()))?;

    // Minimum-order checks run against the order's pre-discount subtotal
    // when the caller names an order.
    let order_amount = match body.order_id {
        Some(order_id) => {
            let order = state
                .platform()
                .order_by_id(order_id, user.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
            Some(order.subtotal)
        }
        None => None,
    };

    let usage = coupons::track_redemption(
        state.platform(),
        user.id,
        coupon_id,
        order_amount,
        NewDiscountUsage {
            coupon_id,
            user_id: user.id,
            order_id: body.order_id,
            discount_amount: body.discount_amount.unwrap_or(Decimal::ZERO),
        },
    )
    .await?;

    Ok(Json(TrackCouponResponse {
        success: true,
        usage,
    }))
}
