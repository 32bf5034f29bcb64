//! Status enums and type tags for marketplace entities.
//!
//! These mirror the string values stored in the platform tables; serde
//! renames keep the wire format identical to what the database triggers
//! expect.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Payment status.
///
/// Platform triggers run commission calculation when a payment flips to
/// `Paid`, which is why cash-on-delivery orders are marked paid at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
}

/// Payment method selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    BankTransfer,
    Wallet,
}

impl PaymentMethod {
    /// Whether this method settles at the door rather than online.
    #[must_use]
    pub const fn is_cash_on_delivery(self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

/// Discount type tag on a coupon row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    FreeShipping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).expect("serialize"),
            "\"paid\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).expect("serialize"),
            "\"cash_on_delivery\""
        );
        assert_eq!(
            serde_json::to_string(&DiscountType::FixedAmount).expect("serialize"),
            "\"fixed_amount\""
        );
    }

    #[test]
    fn test_discount_type_parses() {
        let t: DiscountType = serde_json::from_str("\"free_shipping\"").expect("deserialize");
        assert_eq!(t, DiscountType::FreeShipping);
    }

    #[test]
    fn test_cash_on_delivery_flag() {
        assert!(PaymentMethod::CashOnDelivery.is_cash_on_delivery());
        assert!(!PaymentMethod::Card.is_cash_on_delivery());
    }
}
