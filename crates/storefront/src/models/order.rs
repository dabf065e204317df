//! Order intent types that round-trip through the gateway metadata bag.
//!
//! The metadata bag attached at session creation is the only continuity
//! mechanism between checkout and webhook reconciliation, so these shapes are
//! a wire contract: field names must stay stable across both sides.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarplum_core::ProductId;

use super::CartLine;

/// Per-line order summary embedded in session metadata as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemSummary {
    /// Product record ID.
    pub id: ProductId,
    pub name: String,
    /// Effective unit price in decimal major units.
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&CartLine> for OrderItemSummary {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            price: line.effective_price(),
            quantity: line.quantity,
        }
    }
}

/// Shipping address, either supplied by the shopper at checkout time or
/// synthesized from the gateway's collected shipping details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_item_summary_from_cart_line() {
        let line = CartLine {
            id: ProductId::new("p1"),
            name: "Widget".to_string(),
            description: None,
            image: None,
            slug: None,
            price: "9.99".parse().unwrap(),
            promo_price: Some("7.49".parse().unwrap()),
            quantity: 3,
        };

        let summary = OrderItemSummary::from(&line);
        assert_eq!(summary.id, ProductId::new("p1"));
        assert_eq!(summary.price, "7.49".parse::<Decimal>().unwrap());
        assert_eq!(summary.quantity, 3);
    }

    #[test]
    fn test_summary_parses_numeric_prices() {
        // Metadata written by older clients carries prices as JSON numbers.
        let json = r#"[{"id":"p1","name":"Widget","price":9.99,"quantity":2}]"#;
        let items: Vec<OrderItemSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 1);
        let item = items.first().unwrap();
        assert_eq!(item.price, "9.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_shipping_address_camel_case() {
        let json = r#"{"name":"Jo","line1":"1 Main St","city":"Springfield","state":"IL","postalCode":"62701","country":"US"}"#;
        let addr: ShippingAddress = serde_json::from_str(json).unwrap();
        assert_eq!(addr.postal_code, "62701");
        assert_eq!(addr.line2, "");
        assert_eq!(addr.phone, "");
    }
}
