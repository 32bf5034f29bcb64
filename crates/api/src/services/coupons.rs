//! Coupon validation and discount computation.
//!
//! One rule set serves both callers: the checkout quote treats any rejection
//! as "no discount" and moves on, while the redemption endpoint surfaces the
//! rejection to the client. The global usage limit is only enforced at
//! redemption time; the quote path deliberately skips it.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use vendora_core::{CouponId, DiscountType, UserId};

use crate::error::{AppError, Result};
use crate::platform::PlatformClient;
use crate::platform::types::{CouponRow, CouponScope, DiscountUsageRow, NewDiscountUsage};

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Coupon not found")]
    NotFound,
    #[error("Coupon is not active")]
    Inactive,
    #[error("Coupon is not yet valid")]
    NotStarted,
    #[error("Coupon has expired")]
    Expired,
    #[error("Order amount is below the coupon minimum of {0}")]
    MinimumOrderNotMet(Decimal),
    #[error("Coupon usage limit reached for this user")]
    UserLimitReached,
    #[error("Coupon usage limit reached")]
    GlobalLimitReached,
}

impl CouponRejection {
    /// Map a rejection to the redemption endpoint's error response.
    #[must_use]
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::NotFound => AppError::NotFound(self.to_string()),
            _ => AppError::BadRequest(self.to_string()),
        }
    }
}

/// Which usage limits to enforce.
///
/// The quote path skips the global counter; only redemption checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPolicy {
    PerUserOnly,
    All,
}

/// Validate a coupon against the shared rule set.
///
/// `order_amount` is `None` when the caller has no order context (redemption
/// without an order id); the minimum-order rule is skipped in that case.
///
/// # Errors
///
/// Returns the first failing rule as a [`CouponRejection`].
pub fn validate_coupon(
    coupon: &CouponRow,
    order_amount: Option<Decimal>,
    user_usage_count: i64,
    policy: LimitPolicy,
    now: DateTime<Utc>,
) -> std::result::Result<(), CouponRejection> {
    if !coupon.is_active || coupon.status != "active" {
        return Err(CouponRejection::Inactive);
    }

    if coupon.start_date.is_some_and(|start| start > now) {
        return Err(CouponRejection::NotStarted);
    }
    if coupon.end_date.is_some_and(|end| end < now) {
        return Err(CouponRejection::Expired);
    }

    if let Some(amount) = order_amount {
        if coupon.minimum_order_amount > Decimal::ZERO && amount < coupon.minimum_order_amount {
            return Err(CouponRejection::MinimumOrderNotMet(
                coupon.minimum_order_amount,
            ));
        }
    }

    if coupon
        .usage_limit_per_user
        .is_some_and(|limit| user_usage_count >= limit)
    {
        return Err(CouponRejection::UserLimitReached);
    }

    if policy == LimitPolicy::All
        && coupon
            .usage_limit
            .is_some_and(|limit| coupon.used_count >= limit)
    {
        return Err(CouponRejection::GlobalLimitReached);
    }

    Ok(())
}

/// Compute the discount a coupon grants on an order amount.
///
/// Percentage discounts round to 2 decimal places and are capped at
/// `maximum_discount_amount` when set, else at the order amount itself.
/// Fixed discounts never exceed the order amount. Free shipping grants no
/// monetary discount; the caller waives shipping instead.
#[must_use]
pub fn discount_amount(coupon: &CouponRow, order_amount: Decimal) -> Decimal {
    match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = (order_amount * coupon.value / Decimal::from(100))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            let cap = coupon.maximum_discount_amount.unwrap_or(order_amount);
            raw.min(cap)
        }
        DiscountType::FixedAmount => coupon.value.min(order_amount),
        DiscountType::FreeShipping => Decimal::ZERO,
    }
}

/// A coupon as applied to a checkout quote.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedCoupon {
    pub id: CouponId,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub discount_amount: Decimal,
    pub free_shipping: bool,
}

/// Fetch the caller's redemption count for a coupon, but only when the
/// coupon actually carries a per-user limit.
async fn user_usage_count(
    platform: &PlatformClient,
    coupon: &CouponRow,
    user_id: UserId,
) -> Result<i64> {
    if coupon.usage_limit_per_user.is_none() {
        return Ok(0);
    }
    Ok(platform.coupon_usage_count(coupon.id, user_id).await?)
}

/// Resolve a coupon code for a checkout quote.
///
/// Invalid or unknown codes quietly produce no discount; the quote must not
/// fail because a promotion ended.
///
/// # Errors
///
/// Returns `AppError::Platform` only when a lookup itself fails.
pub async fn quote_coupon(
    platform: &PlatformClient,
    user_id: UserId,
    code: &str,
    order_amount: Decimal,
) -> Result<Option<AppliedCoupon>> {
    let Some(coupon) = platform.coupon_by_code(code).await? else {
        tracing::debug!(code, "Coupon code not found, quoting without discount");
        return Ok(None);
    };

    let usage = user_usage_count(platform, &coupon, user_id).await?;

    if let Err(rejection) = validate_coupon(
        &coupon,
        Some(order_amount),
        usage,
        LimitPolicy::PerUserOnly,
        Utc::now(),
    ) {
        tracing::debug!(code, %rejection, "Coupon rejected, quoting without discount");
        return Ok(None);
    }

    Ok(Some(AppliedCoupon {
        id: coupon.id,
        code: coupon.code.clone(),
        discount_type: coupon.discount_type,
        discount_amount: discount_amount(&coupon, order_amount),
        free_shipping: coupon.discount_type == DiscountType::FreeShipping,
    }))
}

/// A coupon listed to the caller, annotated with their remaining uses.
#[derive(Debug, Clone, Serialize)]
pub struct ValidCoupon {
    #[serde(flatten)]
    pub coupon: CouponRow,
    /// Remaining redemptions for this caller; `None` means unlimited.
    pub remaining_uses: Option<i64>,
}

/// List the coupons currently valid for the caller.
///
/// Active-flag and scope filtering happen on the platform; date windows and
/// the per-user limit run through the shared rules here. A coupon the caller
/// has exhausted is excluded entirely rather than listed with zero uses.
///
/// # Errors
///
/// Returns `AppError::Platform` when a lookup fails.
pub async fn list_valid_coupons(
    platform: &PlatformClient,
    user_id: UserId,
    scope: CouponScope,
) -> Result<Vec<ValidCoupon>> {
    let coupons = platform.list_active_coupons(scope).await?;
    let now = Utc::now();

    let mut valid = Vec::with_capacity(coupons.len());
    for coupon in coupons {
        let usage = user_usage_count(platform, &coupon, user_id).await?;
        if validate_coupon(&coupon, None, usage, LimitPolicy::PerUserOnly, now).is_ok() {
            let remaining_uses = coupon.usage_limit_per_user.map(|limit| (limit - usage).max(0));
            valid.push(ValidCoupon {
                coupon,
                remaining_uses,
            });
        }
    }

    Ok(valid)
}

/// Record a coupon redemption against an order.
///
/// Validates with the full limit policy, inserts the usage row, then bumps
/// the coupon's global counter: RPC first, manual update as fallback, both
/// best-effort.
///
/// # Errors
///
/// Returns 404 for an unknown coupon, 400 for any other rejection, and
/// `AppError::Platform` when the usage insert itself fails.
pub async fn track_redemption(
    platform: &PlatformClient,
    user_id: UserId,
    coupon_id: CouponId,
    order_amount: Option<Decimal>,
    usage: NewDiscountUsage,
) -> Result<DiscountUsageRow> {
    let coupon = platform
        .coupon_by_id(coupon_id)
        .await?
        .ok_or_else(|| CouponRejection::NotFound.into_app_error())?;

    let user_usage = user_usage_count(platform, &coupon, user_id).await?;

    validate_coupon(
        &coupon,
        order_amount,
        user_usage,
        LimitPolicy::All,
        Utc::now(),
    )
    .map_err(CouponRejection::into_app_error)?;

    let record = platform.insert_discount_usage(&usage).await?;

    // Best-effort counter bump; the usage row is already the source of truth
    // for per-user limits.
    if let Err(e) = platform.increment_coupon_usage(coupon.id).await {
        tracing::warn!(error = %e, coupon_id = %coupon.id, "Counter RPC failed, patching directly");
        if let Err(e) = platform
            .set_coupon_used_count(coupon.id, coupon.used_count + 1)
            .await
        {
            tracing::warn!(error = %e, coupon_id = %coupon.id, "Fallback counter update failed");
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn coupon(discount_type: DiscountType, value: Decimal) -> CouponRow {
        CouponRow {
            id: CouponId::new(Uuid::new_v4()),
            code: "WELCOME10".to_string(),
            discount_type,
            value,
            maximum_discount_amount: None,
            minimum_order_amount: Decimal::ZERO,
            usage_limit: None,
            usage_limit_per_user: None,
            used_count: 0,
            start_date: None,
            end_date: None,
            is_active: true,
            status: "active".to_string(),
            vendor_id: None,
            product_id: None,
            category_id: None,
            brand_id: None,
        }
    }

    fn dec(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn test_percentage_discount_capped_by_maximum() {
        // 10% of $100 with a $5 cap -> $5, not $10
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.maximum_discount_amount = Some(dec(5, 0));
        assert_eq!(discount_amount(&c, dec(100, 0)), dec(5, 0));
    }

    #[test]
    fn test_percentage_discount_uncapped() {
        let c = coupon(DiscountType::Percentage, dec(10, 0));
        assert_eq!(discount_amount(&c, dec(100, 0)), dec(10, 0));
    }

    #[test]
    fn test_percentage_discount_never_exceeds_order_amount() {
        let c = coupon(DiscountType::Percentage, dec(150, 0));
        assert_eq!(discount_amount(&c, dec(40, 0)), dec(40, 0));
    }

    #[test]
    fn test_percentage_discount_rounds_to_cents() {
        // 10% of $33.33 = 3.333 -> 3.33
        let c = coupon(DiscountType::Percentage, dec(10, 0));
        assert_eq!(discount_amount(&c, dec(3333, 2)), dec(333, 2));
    }

    #[test]
    fn test_fixed_discount_capped_at_order_amount() {
        // $50 off a $30 order -> $30
        let c = coupon(DiscountType::FixedAmount, dec(50, 0));
        assert_eq!(discount_amount(&c, dec(30, 0)), dec(30, 0));
    }

    #[test]
    fn test_fixed_discount_below_order_amount() {
        let c = coupon(DiscountType::FixedAmount, dec(5, 0));
        assert_eq!(discount_amount(&c, dec(30, 0)), dec(5, 0));
    }

    #[test]
    fn test_free_shipping_grants_no_monetary_discount() {
        let c = coupon(DiscountType::FreeShipping, Decimal::ZERO);
        assert_eq!(discount_amount(&c, dec(30, 0)), Decimal::ZERO);
    }

    #[test]
    fn test_inactive_coupon_rejected() {
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.is_active = false;
        let err = validate_coupon(&c, None, 0, LimitPolicy::All, Utc::now()).expect_err("rejected");
        assert_eq!(err, CouponRejection::Inactive);
    }

    #[test]
    fn test_non_active_status_rejected() {
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.status = "draft".to_string();
        let err = validate_coupon(&c, None, 0, LimitPolicy::All, Utc::now()).expect_err("rejected");
        assert_eq!(err, CouponRejection::Inactive);
    }

    #[test]
    fn test_future_start_date_rejected() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.start_date = Some(now + Duration::days(1));
        let err = validate_coupon(&c, None, 0, LimitPolicy::All, now).expect_err("rejected");
        assert_eq!(err, CouponRejection::NotStarted);
    }

    #[test]
    fn test_past_end_date_rejected() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.end_date = Some(now - Duration::days(1));
        let err = validate_coupon(&c, None, 0, LimitPolicy::All, now).expect_err("rejected");
        assert_eq!(err, CouponRejection::Expired);
    }

    #[test]
    fn test_open_date_window_accepted() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.start_date = Some(now - Duration::days(1));
        c.end_date = Some(now + Duration::days(1));
        assert!(validate_coupon(&c, None, 0, LimitPolicy::All, now).is_ok());
    }

    #[test]
    fn test_minimum_order_amount_enforced() {
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.minimum_order_amount = dec(50, 0);
        let err = validate_coupon(&c, Some(dec(30, 0)), 0, LimitPolicy::All, Utc::now())
            .expect_err("rejected");
        assert_eq!(err, CouponRejection::MinimumOrderNotMet(dec(50, 0)));
    }

    #[test]
    fn test_minimum_order_skipped_without_amount() {
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.minimum_order_amount = dec(50, 0);
        assert!(validate_coupon(&c, None, 0, LimitPolicy::All, Utc::now()).is_ok());
    }

    #[test]
    fn test_per_user_limit_enforced() {
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.usage_limit_per_user = Some(2);
        let err = validate_coupon(&c, None, 2, LimitPolicy::All, Utc::now()).expect_err("rejected");
        assert_eq!(err, CouponRejection::UserLimitReached);
        assert!(validate_coupon(&c, None, 1, LimitPolicy::All, Utc::now()).is_ok());
    }

    #[test]
    fn test_global_limit_enforced_only_at_redemption() {
        let mut c = coupon(DiscountType::Percentage, dec(10, 0));
        c.usage_limit = Some(100);
        c.used_count = 100;
        let err = validate_coupon(&c, None, 0, LimitPolicy::All, Utc::now()).expect_err("rejected");
        assert_eq!(err, CouponRejection::GlobalLimitReached);
        // The quote path skips the global counter
        assert!(validate_coupon(&c, None, 0, LimitPolicy::PerUserOnly, Utc::now()).is_ok());
    }

    #[test]
    fn test_rejection_error_mapping() {
        assert!(matches!(
            CouponRejection::NotFound.into_app_error(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            CouponRejection::Expired.into_app_error(),
            AppError::BadRequest(_)
        ));
    }
}
