//! Platform REST/RPC client implementation.
//!
//! Uses `reqwest` for HTTP with PostgREST-style filter parameters.
//! Caches products and variants using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use vendora_core::{CouponId, OrderId, PaymentId, ProductId, UserId, VariantId, VendorId};

use crate::config::PlatformConfig;
use crate::platform::PlatformError;
use crate::platform::types::{
    AuthedUser, CartItemRow, CouponRow, CouponScope, DeliveryRow, DiscountUsageRow, NewDelivery,
    NewDiscountUsage, NewOrder, NewOrderItem, NewPayment, OrderItemRow, OrderRow,
    OrderWithDetails, PaymentRow, ProductRow, VariantRow,
};

/// Cached catalog entries, keyed by `product:{id}` / `variant:{id}`.
#[derive(Clone)]
enum CacheValue {
    Product(ProductRow),
    Variant(VariantRow),
}

// =============================================================================
// PlatformClient
// =============================================================================

/// Client for the hosted data platform.
///
/// Provides typed access to catalog, coupon, and order tables plus the
/// server-side RPC functions. Products and variants are cached for 5 minutes.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
}

struct PlatformClientInner {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    cache: Cache<String, CacheValue>,
}

impl PlatformClient {
    /// Create a new platform client.
    #[must_use]
    pub fn new(config: &PlatformConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(PlatformClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                service_key: config.service_key.expose_secret().to_string(),
                cache,
            }),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base_url)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.inner.base_url)
    }

    /// Attach the service credentials to a request.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.inner.service_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.inner.service_key),
            )
    }

    /// Map a non-success response to a `PlatformError`.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(PlatformError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Platform API returned non-success status"
            );
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect::<String>(),
            });
        }

        Ok(response)
    }

    /// Fetch rows from a table with PostgREST-style filters.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, PlatformError> {
        let response = self
            .authorize(self.inner.client.get(self.table_url(table)))
            .query(query)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Insert rows into a table, returning their representation.
    async fn insert<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        table: &str,
        payload: &T,
    ) -> Result<Vec<R>, PlatformError> {
        let response = self
            .authorize(self.inner.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Insert a single row, returning its representation.
    async fn insert_one<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        payload: &T,
    ) -> Result<R, PlatformError> {
        // PostgREST wants a JSON array even for single-row inserts
        let mut rows: Vec<R> = self.insert(table, std::slice::from_ref(payload)).await?;
        rows.pop().ok_or(PlatformError::EmptyRepresentation)
    }

    /// Patch rows matching the filters.
    async fn update<T: Serialize>(
        &self,
        table: &str,
        query: &[(&str, String)],
        payload: &T,
    ) -> Result<(), PlatformError> {
        let response = self
            .authorize(self.inner.client.patch(self.table_url(table)))
            .query(query)
            .json(payload)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Count rows matching the filters via the `Content-Range` header.
    async fn count(&self, table: &str, query: &[(&str, String)]) -> Result<i64, PlatformError> {
        let response = self
            .authorize(self.inner.client.get(self.table_url(table)))
            .query(query)
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        // Content-Range: 0-0/42 (total after the slash)
        response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(|range| range.rsplit('/').next())
            .and_then(|total| total.parse::<i64>().ok())
            .ok_or(PlatformError::MissingCount)
    }

    /// Invoke a server-side RPC function.
    ///
    /// Void functions return an empty body; that is surfaced as JSON `null`
    /// so callers can deserialize into `Option<_>` or `Value`.
    async fn rpc<T: Serialize, R: DeserializeOwned>(
        &self,
        function: &str,
        args: &T,
    ) -> Result<R, PlatformError> {
        let response = self
            .authorize(self.inner.client.post(self.rpc_url(function)))
            .json(args)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_str(&text)?)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch products by id in a single batched lookup.
    ///
    /// Cached entries are served from memory; only the missing ids hit the
    /// platform. Unknown ids are simply absent from the result.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn products_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<Vec<ProductRow>, PlatformError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.inner.cache.get(&format!("product:{id}")).await {
                Some(CacheValue::Product(row)) => found.push(row),
                _ => missing.push(*id),
            }
        }

        if missing.is_empty() {
            debug!("All products served from cache");
            return Ok(found);
        }

        let fetched: Vec<ProductRow> = self
            .select("products", &[("id", in_filter(&missing))])
            .await?;

        for row in &fetched {
            self.inner
                .cache
                .insert(format!("product:{}", row.id), CacheValue::Product(row.clone()))
                .await;
        }

        found.extend(fetched);
        Ok(found)
    }

    /// Fetch variants by id in a single batched lookup.
    #[instrument(skip(self), fields(count = ids.len()))]
    pub async fn variants_by_ids(
        &self,
        ids: &[VariantId],
    ) -> Result<Vec<VariantRow>, PlatformError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.inner.cache.get(&format!("variant:{id}")).await {
                Some(CacheValue::Variant(row)) => found.push(row),
                _ => missing.push(*id),
            }
        }

        if missing.is_empty() {
            debug!("All variants served from cache");
            return Ok(found);
        }

        let fetched: Vec<VariantRow> = self
            .select("product_variants", &[("id", in_filter(&missing))])
            .await?;

        for row in &fetched {
            self.inner
                .cache
                .insert(format!("variant:{}", row.id), CacheValue::Variant(row.clone()))
                .await;
        }

        found.extend(fetched);
        Ok(found)
    }

    /// Fetch the caller's current cart.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItemRow>, PlatformError> {
        self.select(
            "cart_items",
            &[
                ("user_id", format!("eq.{user_id}")),
                ("select", "product_id,variant_id,quantity".to_string()),
            ],
        )
        .await
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Look up a coupon by its code.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponRow>, PlatformError> {
        let mut rows: Vec<CouponRow> = self
            .select(
                "coupons",
                &[("code", format!("eq.{code}")), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.pop())
    }

    /// Look up a coupon by id.
    #[instrument(skip(self), fields(coupon_id = %coupon_id))]
    pub async fn coupon_by_id(
        &self,
        coupon_id: CouponId,
    ) -> Result<Option<CouponRow>, PlatformError> {
        let mut rows: Vec<CouponRow> = self
            .select(
                "coupons",
                &[
                    ("id", format!("eq.{coupon_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.pop())
    }

    /// List active coupons, optionally scoped to a vendor/product/category/brand.
    ///
    /// Only the flag and status filters run on the platform; date windows and
    /// usage limits are evaluated by the shared coupon rules so the listing
    /// and the redemption path cannot drift apart.
    #[instrument(skip(self))]
    pub async fn list_active_coupons(
        &self,
        scope: CouponScope,
    ) -> Result<Vec<CouponRow>, PlatformError> {
        let mut query: Vec<(&str, String)> = vec![
            ("is_active", "eq.true".to_string()),
            ("status", "eq.active".to_string()),
        ];
        if let Some(vendor_id) = scope.vendor_id {
            query.push(("vendor_id", format!("eq.{vendor_id}")));
        }
        if let Some(product_id) = scope.product_id {
            query.push(("product_id", format!("eq.{product_id}")));
        }
        if let Some(category_id) = scope.category_id {
            query.push(("category_id", format!("eq.{category_id}")));
        }
        if let Some(brand_id) = scope.brand_id {
            query.push(("brand_id", format!("eq.{brand_id}")));
        }

        self.select("coupons", &query).await
    }

    /// Count how many times a user has redeemed a coupon.
    #[instrument(skip(self), fields(coupon_id = %coupon_id, user_id = %user_id))]
    pub async fn coupon_usage_count(
        &self,
        coupon_id: CouponId,
        user_id: UserId,
    ) -> Result<i64, PlatformError> {
        self.count(
            "discount_usage",
            &[
                ("coupon_id", format!("eq.{coupon_id}")),
                ("user_id", format!("eq.{user_id}")),
            ],
        )
        .await
    }

    /// Record a coupon redemption.
    #[instrument(skip(self, usage), fields(coupon_id = %usage.coupon_id))]
    pub async fn insert_discount_usage(
        &self,
        usage: &NewDiscountUsage,
    ) -> Result<DiscountUsageRow, PlatformError> {
        self.insert_one("discount_usage", usage).await
    }

    /// Increment a coupon's global redemption counter via RPC.
    #[instrument(skip(self), fields(coupon_id = %coupon_id))]
    pub async fn increment_coupon_usage(&self, coupon_id: CouponId) -> Result<(), PlatformError> {
        let _: serde_json::Value = self
            .rpc(
                "increment_coupon_usage",
                &serde_json::json!({ "coupon_id": coupon_id }),
            )
            .await?;
        Ok(())
    }

    /// Manual fallback for [`Self::increment_coupon_usage`].
    #[instrument(skip(self), fields(coupon_id = %coupon_id))]
    pub async fn set_coupon_used_count(
        &self,
        coupon_id: CouponId,
        used_count: i64,
    ) -> Result<(), PlatformError> {
        self.update(
            "coupons",
            &[("id", format!("eq.{coupon_id}"))],
            &serde_json::json!({ "used_count": used_count }),
        )
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Insert an order row.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn insert_order(&self, order: &NewOrder) -> Result<OrderRow, PlatformError> {
        self.insert_one("orders", order).await
    }

    /// Batch-insert order line items.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn insert_order_items(
        &self,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItemRow>, PlatformError> {
        self.insert("order_items", items).await
    }

    /// Insert a payment stub.
    #[instrument(skip(self, payment), fields(order_id = %payment.order_id))]
    pub async fn insert_payment(&self, payment: &NewPayment) -> Result<PaymentRow, PlatformError> {
        self.insert_one("payments", payment).await
    }

    /// Flip a payment's status to paid.
    ///
    /// Platform triggers pick this up and run commission calculation.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn mark_payment_paid(&self, payment_id: PaymentId) -> Result<(), PlatformError> {
        self.update(
            "payments",
            &[("id", format!("eq.{payment_id}"))],
            &serde_json::json!({ "status": "paid" }),
        )
        .await
    }

    /// Insert a delivery stub.
    #[instrument(skip(self, delivery), fields(order_id = %delivery.order_id))]
    pub async fn insert_delivery(
        &self,
        delivery: &NewDelivery,
    ) -> Result<DeliveryRow, PlatformError> {
        self.insert_one("deliveries", delivery).await
    }

    /// Fetch one of the caller's orders.
    ///
    /// Scoped to the owning user so a caller can never redeem against
    /// somebody else's order.
    #[instrument(skip(self), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn order_by_id(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderRow>, PlatformError> {
        let mut rows: Vec<OrderRow> = self
            .select(
                "orders",
                &[
                    ("id", format!("eq.{order_id}")),
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.pop())
    }

    /// Fetch the caller's orders with embedded items, payments, and deliveries.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn orders_with_details(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithDetails>, PlatformError> {
        self.select(
            "orders",
            &[
                ("user_id", format!("eq.{user_id}")),
                (
                    "select",
                    "*,order_items(*),payments(*),deliveries(*)".to_string(),
                ),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Ask the platform for the cheapest delivery rate for an order.
    ///
    /// Returns `None` when no rate is configured.
    #[instrument(skip(self))]
    pub async fn cheapest_delivery_rate(
        &self,
        vendor_id: Option<VendorId>,
        subtotal: Decimal,
    ) -> Result<Option<Decimal>, PlatformError> {
        self.rpc(
            "get_cheapest_delivery_option",
            &serde_json::json!({
                "vendor_id": vendor_id,
                "order_subtotal": subtotal,
            }),
        )
        .await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Resolve a bearer token to the authenticated user.
    ///
    /// Returns `Ok(None)` when the platform rejects the token.
    #[instrument(skip(self, token))]
    pub async fn user_from_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthedUser>, PlatformError> {
        let response = self
            .inner
            .client
            .get(format!("{}/auth/v1/user", self.inner.base_url))
            .header("apikey", &self.inner.service_key)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }

        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Cheap connectivity probe for the readiness endpoint.
    pub async fn ping(&self) -> Result<(), PlatformError> {
        let response = self
            .authorize(self.inner.client.get(format!("{}/rest/v1/", self.inner.base_url)))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// Render ids as a PostgREST `in.(...)` filter value.
fn in_filter<T: std::fmt::Display>(ids: &[T]) -> String {
    let joined = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_in_filter_renders_postgrest_syntax() {
        let a = ProductId::new(Uuid::nil());
        let filter = in_filter(&[a]);
        assert_eq!(filter, format!("in.({})", Uuid::nil()));
    }

    #[test]
    fn test_in_filter_joins_with_commas() {
        let ids = vec![1, 2, 3];
        assert_eq!(in_filter(&ids), "in.(1,2,3)");
    }
}
