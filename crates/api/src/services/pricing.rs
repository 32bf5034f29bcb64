//! Unit-price resolution for checkout and order lines.
//!
//! The authoritative price for a line is resolved server-side with a fixed
//! fallback chain: variant sale price, variant price, product sale price,
//! product price, then a client-supplied fallback. Items whose price cannot
//! be resolved fail the whole request.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{ProductId, VariantId, resolve_amount};

use crate::error::{AppError, Result};
use crate::platform::types::{ProductRow, VariantRow};
use crate::platform::PlatformClient;

/// A line item as supplied by the client (or loaded from the cart).
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: i64,
    /// Client-supplied unit price, used only when the catalog has none.
    pub price: Option<Decimal>,
    pub price_cents: Option<i64>,
}

/// A line item with its resolved price and catalog snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PricedItem {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Resolve the authoritative unit price for a line.
///
/// Precedence: variant sale price > variant price > product sale price >
/// product price > client fallback. Returns `None` when nothing resolves.
#[must_use]
pub fn resolve_unit_price(
    product: Option<&ProductRow>,
    variant: Option<&VariantRow>,
    fallback: Option<Decimal>,
) -> Option<Decimal> {
    variant
        .and_then(|v| v.sale_price.or(v.price))
        .or_else(|| product.and_then(|p| p.sale_price.or(p.price)))
        .or(fallback)
}

/// Price a list of items against the catalog.
///
/// Products and variants are fetched in at most two batched lookups, issued
/// concurrently. Fails with a 400-class error on a non-positive quantity or
/// an unresolvable price.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for invalid quantities or missing prices,
/// `AppError::Platform` when a lookup fails.
pub async fn price_items(
    platform: &PlatformClient,
    items: &[ItemInput],
) -> Result<Vec<PricedItem>> {
    for item in items {
        if item.quantity < 1 {
            return Err(AppError::BadRequest(format!(
                "Invalid quantity for product {}",
                item.product_id
            )));
        }
    }

    let mut product_ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
    product_ids.sort_unstable_by_key(ProductId::as_uuid);
    product_ids.dedup();

    let mut variant_ids: Vec<VariantId> = items.iter().filter_map(|i| i.variant_id).collect();
    variant_ids.sort_unstable_by_key(VariantId::as_uuid);
    variant_ids.dedup();

    let (products, variants) = tokio::join!(
        platform.products_by_ids(&product_ids),
        platform.variants_by_ids(&variant_ids),
    );
    let products: HashMap<ProductId, ProductRow> =
        products?.into_iter().map(|p| (p.id, p)).collect();
    let variants: HashMap<VariantId, VariantRow> =
        variants?.into_iter().map(|v| (v.id, v)).collect();

    items
        .iter()
        .map(|item| {
            let product = products.get(&item.product_id);
            let variant = item.variant_id.and_then(|id| variants.get(&id));
            let fallback = resolve_amount(item.price, item.price_cents);

            let unit_price = resolve_unit_price(product, variant, fallback).ok_or_else(|| {
                AppError::BadRequest(format!("Missing price for product {}", item.product_id))
            })?;

            let (product_name, sku) = product.map_or_else(
                || (item.product_id.to_string(), None),
                |p| {
                    (
                        p.name.clone(),
                        variant.and_then(|v| v.sku.clone()).or_else(|| p.sku.clone()),
                    )
                },
            );

            Ok(PricedItem {
                product_id: item.product_id,
                variant_id: item.variant_id,
                product_name,
                sku,
                quantity: item.quantity,
                unit_price,
                total_price: unit_price * Decimal::from(item.quantity),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vendora_core::VendorId;

    fn product(price: Option<Decimal>, sale_price: Option<Decimal>) -> ProductRow {
        ProductRow {
            id: ProductId::new(Uuid::new_v4()),
            vendor_id: VendorId::new(Uuid::new_v4()),
            name: "Walnut desk organizer".to_string(),
            sku: Some("WD-100".to_string()),
            price,
            sale_price,
            category_id: None,
            brand_id: None,
            is_active: true,
        }
    }

    fn variant(price: Option<Decimal>, sale_price: Option<Decimal>) -> VariantRow {
        VariantRow {
            id: VariantId::new(Uuid::new_v4()),
            product_id: ProductId::new(Uuid::new_v4()),
            name: Some("Large".to_string()),
            sku: Some("WD-100-L".to_string()),
            price,
            sale_price,
        }
    }

    #[test]
    fn test_variant_sale_price_wins() {
        let p = product(Some(Decimal::new(5000, 2)), Some(Decimal::new(4500, 2)));
        let v = variant(Some(Decimal::new(5500, 2)), Some(Decimal::new(4000, 2)));
        assert_eq!(
            resolve_unit_price(Some(&p), Some(&v), None),
            Some(Decimal::new(4000, 2))
        );
    }

    #[test]
    fn test_variant_price_beats_product() {
        let p = product(Some(Decimal::new(5000, 2)), Some(Decimal::new(4500, 2)));
        let v = variant(Some(Decimal::new(5500, 2)), None);
        assert_eq!(
            resolve_unit_price(Some(&p), Some(&v), None),
            Some(Decimal::new(5500, 2))
        );
    }

    #[test]
    fn test_product_sale_price_beats_product_price() {
        let p = product(Some(Decimal::new(5000, 2)), Some(Decimal::new(4500, 2)));
        assert_eq!(
            resolve_unit_price(Some(&p), None, None),
            Some(Decimal::new(4500, 2))
        );
    }

    #[test]
    fn test_priceless_variant_falls_through_to_product() {
        let p = product(Some(Decimal::new(5000, 2)), None);
        let v = variant(None, None);
        assert_eq!(
            resolve_unit_price(Some(&p), Some(&v), None),
            Some(Decimal::new(5000, 2))
        );
    }

    #[test]
    fn test_client_fallback_used_last() {
        let p = product(None, None);
        assert_eq!(
            resolve_unit_price(Some(&p), None, Some(Decimal::new(1299, 2))),
            Some(Decimal::new(1299, 2))
        );
    }

    #[test]
    fn test_no_price_resolves_to_none() {
        let p = product(None, None);
        assert_eq!(resolve_unit_price(Some(&p), None, None), None);
        assert_eq!(resolve_unit_price(None, None, None), None);
    }
}
