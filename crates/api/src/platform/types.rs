//! Row shapes and insert payloads for platform tables.
//!
//! These structs mirror the platform tables by shape only; the tables (and
//! the triggers that keep order/payment/delivery status in sync) are owned
//! by the platform. Monetary columns are decimal units, never cents.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{
    AddressId, BrandId, CategoryId, CouponId, DeliveryId, DeliveryStatus, DiscountType,
    DiscountUsageId, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus,
    ProductId, UserId, VariantId, VendorId,
};

// =============================================================================
// Catalog
// =============================================================================

/// A product row.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub name: String,
    pub sku: Option<String>,
    /// Base price; may be absent for listings priced only at variant level.
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
    pub is_active: bool,
}

/// A product variant row.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantRow {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// A row in the caller's cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRow {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: i64,
}

// =============================================================================
// Coupons
// =============================================================================

/// A coupon row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponRow {
    pub id: CouponId,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: Decimal,
    /// Cap applied to percentage discounts when set.
    pub maximum_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub minimum_order_amount: Decimal,
    /// Global redemption cap across all users.
    pub usage_limit: Option<i64>,
    pub usage_limit_per_user: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub status: String,
    pub vendor_id: Option<VendorId>,
    pub product_id: Option<ProductId>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
}

/// A coupon redemption record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountUsageRow {
    pub id: DiscountUsageId,
    pub coupon_id: CouponId,
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub discount_amount: Decimal,
    pub used_at: DateTime<Utc>,
}

/// Insert payload for a coupon redemption.
#[derive(Debug, Clone, Serialize)]
pub struct NewDiscountUsage {
    pub coupon_id: CouponId,
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub discount_amount: Decimal,
}

// =============================================================================
// Orders
// =============================================================================

/// An order row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// An order line item row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    /// Name snapshot at purchase time; catalog edits don't rewrite history.
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A payment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
}

/// A delivery row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRow {
    pub id: DeliveryId,
    pub order_id: OrderId,
    pub status: DeliveryStatus,
    pub tracking_number: String,
    pub estimated_delivery_date: DateTime<Utc>,
}

/// An order with its embedded items, payments, and deliveries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: OrderRow,
    #[serde(default)]
    pub order_items: Vec<OrderItemRow>,
    #[serde(default)]
    pub payments: Vec<PaymentRow>,
    #[serde(default)]
    pub deliveries: Vec<DeliveryRow>,
}

/// Insert payload for an order.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
}

/// Insert payload for an order line item.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Insert payload for a payment stub.
#[derive(Debug, Clone, Serialize)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
}

/// Insert payload for a delivery stub.
#[derive(Debug, Clone, Serialize)]
pub struct NewDelivery {
    pub order_id: OrderId,
    pub status: DeliveryStatus,
    pub tracking_number: String,
    pub estimated_delivery_date: DateTime<Utc>,
}

// =============================================================================
// Auth
// =============================================================================

/// The identity resolved from a bearer token by the platform auth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthedUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Optional scope filters for the valid-coupons listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponScope {
    pub vendor_id: Option<VendorId>,
    pub product_id: Option<ProductId>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
}
