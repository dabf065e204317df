//! Request and event types for the payment gateway API.
//!
//! The gateway's REST API consumes `application/x-www-form-urlencoded` bodies
//! with bracket notation for nesting, so the request side builds flat
//! key/value pairs rather than JSON. Webhook events arrive as JSON.

use std::collections::BTreeMap;

use serde::Deserialize;
use sugarplum_core::{EventId, SessionId};

// =============================================================================
// Checkout Session creation (request side)
// =============================================================================

/// Parameters for creating a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    /// Checkout mode (`payment` for one-time purchases).
    pub mode: String,
    pub success_url: String,
    pub cancel_url: String,
    pub payment_method_types: Vec<String>,
    pub line_items: Vec<LineItemParams>,
    /// Opaque metadata echoed back verbatim on the webhook event.
    /// `BTreeMap` keeps the encoded form deterministic.
    pub metadata: BTreeMap<String, String>,
    /// Countries the hosted page may collect a shipping address for.
    pub allowed_countries: Vec<String>,
    pub shipping_options: Vec<ShippingOptionParams>,
}

/// A single line item with inline price data.
#[derive(Debug, Clone)]
pub struct LineItemParams {
    pub name: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    /// Product record ID, attached as product metadata.
    pub product_id: String,
    /// ISO currency code (lowercase).
    pub currency: String,
    /// Unit amount in the smallest currency unit (integer cents).
    pub unit_amount: i64,
    pub quantity: u32,
}

/// A fixed-amount shipping option offered on the hosted page.
#[derive(Debug, Clone)]
pub struct ShippingOptionParams {
    pub display_name: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    /// Delivery estimate window in business days.
    pub delivery_min_days: u32,
    pub delivery_max_days: u32,
}

impl CheckoutSessionParams {
    /// Flatten into the bracket-notation form pairs the gateway API expects.
    #[must_use]
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = Vec::new();

        form.push(("mode".to_string(), self.mode.clone()));
        form.push(("success_url".to_string(), self.success_url.clone()));
        form.push(("cancel_url".to_string(), self.cancel_url.clone()));

        for (i, pm) in self.payment_method_types.iter().enumerate() {
            form.push((format!("payment_method_types[{i}]"), pm.clone()));
        }

        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((
                format!("{prefix}[price_data][currency]"),
                item.currency.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(description) = &item.description {
                form.push((
                    format!("{prefix}[price_data][product_data][description]"),
                    description.clone(),
                ));
            }
            for (j, image) in item.images.iter().enumerate() {
                form.push((
                    format!("{prefix}[price_data][product_data][images][{j}]"),
                    image.clone(),
                ));
            }
            form.push((
                format!("{prefix}[price_data][product_data][metadata][productId]"),
                item.product_id.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
        }

        for (key, value) in &self.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        for (i, country) in self.allowed_countries.iter().enumerate() {
            form.push((
                format!("shipping_address_collection[allowed_countries][{i}]"),
                country.clone(),
            ));
        }

        for (i, option) in self.shipping_options.iter().enumerate() {
            let prefix = format!("shipping_options[{i}][shipping_rate_data]");
            form.push((format!("{prefix}[type]"), "fixed_amount".to_string()));
            form.push((
                format!("{prefix}[fixed_amount][amount]"),
                option.amount.to_string(),
            ));
            form.push((
                format!("{prefix}[fixed_amount][currency]"),
                option.currency.clone(),
            ));
            form.push((
                format!("{prefix}[display_name]"),
                option.display_name.clone(),
            ));
            form.push((
                format!("{prefix}[delivery_estimate][minimum][unit]"),
                "business_day".to_string(),
            ));
            form.push((
                format!("{prefix}[delivery_estimate][minimum][value]"),
                option.delivery_min_days.to_string(),
            ));
            form.push((
                format!("{prefix}[delivery_estimate][maximum][unit]"),
                "business_day".to_string(),
            ));
            form.push((
                format!("{prefix}[delivery_estimate][maximum][value]"),
                option.delivery_max_days.to_string(),
            ));
        }

        form
    }
}

/// A created checkout session, as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: SessionId,
    /// Hosted payment page URL the browser should redirect to.
    pub url: Option<String>,
}

// =============================================================================
// Webhook events
// =============================================================================

/// A verified webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

/// Event payload container; `object` shape depends on the event kind.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The session object carried by a `checkout.session.completed` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedSession {
    pub id: SessionId,
    pub payment_intent: Option<String>,
    /// Total charged, in the smallest currency unit (includes shipping).
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    /// The metadata bag attached at session creation, echoed back verbatim.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub shipping_details: Option<ShippingDetails>,
    pub shipping_cost: Option<ShippingCost>,
}

/// Shipping details the gateway collected on the hosted page.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<EventAddress>,
}

/// Address fields on gateway shipping details (snake_case on the wire).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Shipping option the shopper selected, as reported on the event.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingCost {
    /// Shipping amount in the smallest currency unit.
    #[serde(alias = "amount")]
    pub amount_total: Option<i64>,
    pub display_name: Option<String>,
}
