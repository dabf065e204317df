//! Cart line items as sent by the browser.
//!
//! The cart itself lives in browser-persisted local storage and is never
//! stored server-side; the create-checkout request carries a snapshot of it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sugarplum_core::ProductId;

/// A single cart line from the browser cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product record ID in the collection store.
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product image URL, passed through to the gateway's hosted page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Regular unit price in decimal major units.
    pub price: Decimal,
    /// Promotional unit price; takes precedence over `price` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<Decimal>,
    pub quantity: u32,
}

impl CartLine {
    /// The unit price actually charged: `promo_price` if present, else `price`.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.promo_price.unwrap_or(self.price)
    }

    /// Line subtotal in decimal major units.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.effective_price() * Decimal::from(self.quantity)
    }
}
