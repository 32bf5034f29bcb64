//! HTTP route handlers for the customer API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (pings the platform)
//!
//! # Checkout (requires auth)
//! GET  /api/customers/checkout    - Re-quote the current cart
//! POST /api/customers/checkout    - Quote a checkout (items, coupon, totals)
//!
//! # Orders (requires auth)
//! GET  /api/customers/orders      - Order history with items/payments/deliveries
//! POST /api/customers/orders      - Create an order (201)
//!
//! # Coupons (requires auth; CORS-enabled for browser calls)
//! GET  /api/customers/coupons     - Currently valid coupons for the caller
//! POST /api/customers/coupons     - Record a coupon redemption
//! ```

pub mod checkout;
pub mod coupons;
pub mod orders;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ApiConfig;
use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", get(checkout::quote_cart).post(checkout::quote))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", get(orders::list).post(orders::create))
}

/// Create the coupon routes router.
///
/// This group carries a CORS layer because storefront widgets call it
/// directly from the browser; the layer also answers `OPTIONS` preflights.
pub fn coupon_routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::list).post(coupons::track))
        .layer(cors_layer(config))
}

/// Compose all customer API routes.
pub fn routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .nest("/api/customers/checkout", checkout_routes())
        .nest("/api/customers/orders", order_routes())
        .nest("/api/customers/coupons", coupon_routes(config))
}

/// Build the CORS layer from the configured origin allow-list.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
