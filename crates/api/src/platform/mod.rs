//! Hosted data platform client.
//!
//! # Architecture
//!
//! - The platform is source of truth - NO local database, direct API calls
//! - Tables are reached over the platform's REST surface
//!   (`{base}/rest/v1/{table}` with PostgREST-style filter parameters)
//! - Server-side functions are invoked as RPCs (`{base}/rest/v1/rpc/{fn}`)
//! - Bearer tokens are resolved to user identities via `{base}/auth/v1/user`
//! - In-memory caching via `moka` for product/variant lookups (5 minute TTL)
//!
//! Row-level security, commission calculation, and status-sync triggers all
//! run on the platform; this module only shapes requests and responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use vendora_api::platform::PlatformClient;
//!
//! let client = PlatformClient::new(&config.platform);
//!
//! // Batched product lookup
//! let products = client.products_by_ids(&[product_id]).await?;
//!
//! // Record a coupon redemption
//! client.insert_discount_usage(&usage).await?;
//! client.increment_coupon_usage(coupon_id).await?;
//! ```

mod client;
pub mod types;

pub use client::PlatformClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform returned a non-success status.
    #[error("Platform API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the platform.
        status: u16,
        /// Error body, truncated for logging.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A count query came back without a usable `Content-Range` header.
    #[error("Count query returned no content range")]
    MissingCount,

    /// An insert asked for its representation back and got an empty array.
    #[error("Insert returned no representation")]
    EmptyRepresentation,
}
