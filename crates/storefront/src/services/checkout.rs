//! Checkout orchestrator.
//!
//! Turns a browser cart snapshot into a hosted checkout session: validates
//! the cart, converts prices to integer cents, computes the order total
//! locally (independent of whatever the gateway computes), and attaches the
//! reconciliation metadata bag that the webhook side will read back.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::instrument;

use sugarplum_core::{SessionId, money};

use crate::datastore::AuthState;
use crate::error::{AppError, Result};
use crate::models::{CartLine, OrderItemSummary, ShippingAddress};
use crate::stripe::{
    CheckoutSessionParams, LineItemParams, ShippingOptionParams, StripeClient,
};

/// Currency for all checkout sessions.
pub const CURRENCY: &str = "usd";

/// Checkout mode (one-time payment).
pub const MODE: &str = "payment";

/// Countries the hosted page may collect a shipping address for.
pub const ALLOWED_COUNTRIES: &[&str] = &["US", "CA", "GB", "FR"];

/// A successfully created checkout session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedCheckout {
    /// Gateway session ID, also echoed back on the success redirect.
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    /// Hosted payment page URL for the browser redirect.
    pub url: String,
}

/// Orchestrates checkout session creation against the payment gateway.
pub struct CheckoutService<'a> {
    gateway: &'a StripeClient,
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(gateway: &'a StripeClient, base_url: &'a str) -> Self {
        Self { gateway, base_url }
    }

    /// Create a checkout session for an authenticated shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCart`] before any gateway call when the
    /// cart is empty or malformed, and [`AppError::GatewaySession`] when the
    /// gateway rejects the session.
    #[instrument(skip_all, fields(user_id = %auth.user_id(), lines = cart.len()))]
    pub async fn create_session(
        &self,
        auth: &AuthState,
        cart: &[CartLine],
        shipping_address: Option<&ShippingAddress>,
    ) -> Result<CreatedCheckout> {
        let params = build_session_params(auth, cart, shipping_address, self.base_url)?;

        let session = self.gateway.create_checkout_session(&params).await?;

        let url = session
            .url
            .ok_or_else(|| AppError::GatewaySession("no checkout URL returned".to_string()))?;

        tracing::info!(session_id = %session.id, "checkout session created");

        Ok(CreatedCheckout {
            session_id: session.id,
            url,
        })
    }
}

/// Sum of `(promo_price ?? price) * quantity` over all lines, in decimal
/// major units. Order-independent.
#[must_use]
pub fn order_total(cart: &[CartLine]) -> Decimal {
    cart.iter().map(CartLine::subtotal).sum()
}

/// Validate the cart and assemble the full session request.
fn build_session_params(
    auth: &AuthState,
    cart: &[CartLine],
    shipping_address: Option<&ShippingAddress>,
    base_url: &str,
) -> Result<CheckoutSessionParams> {
    if cart.is_empty() {
        return Err(AppError::InvalidCart("cart is empty".to_string()));
    }

    let mut line_items = Vec::with_capacity(cart.len());
    for line in cart {
        if line.quantity == 0 {
            return Err(AppError::InvalidCart(format!(
                "line '{}' has zero quantity",
                line.name
            )));
        }
        let unit_price = line.effective_price();
        if unit_price <= Decimal::ZERO {
            return Err(AppError::InvalidCart(format!(
                "line '{}' has a non-positive price",
                line.name
            )));
        }
        let unit_amount = money::to_cents(unit_price)
            .map_err(|e| AppError::InvalidCart(format!("line '{}': {e}", line.name)))?;

        line_items.push(LineItemParams {
            name: line.name.clone(),
            description: line.description.clone(),
            images: line.image.clone().into_iter().collect(),
            product_id: line.id.to_string(),
            currency: CURRENCY.to_string(),
            unit_amount,
            quantity: line.quantity,
        });
    }

    let total = order_total(cart);
    let order_items: Vec<OrderItemSummary> = cart.iter().map(OrderItemSummary::from).collect();

    let mut metadata = BTreeMap::from([
        ("userId".to_string(), auth.user_id().to_string()),
        (
            "orderItems".to_string(),
            serde_json::to_string(&order_items)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        ),
        ("orderTotal".to_string(), format!("{total:.2}")),
    ]);
    if let Some(address) = shipping_address {
        metadata.insert(
            "shippingAddress".to_string(),
            serde_json::to_string(address).map_err(|e| AppError::Internal(e.to_string()))?,
        );
    }

    Ok(CheckoutSessionParams {
        mode: MODE.to_string(),
        success_url: format!("{base_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{base_url}/checkout/cancel"),
        payment_method_types: vec!["card".to_string()],
        line_items,
        metadata,
        allowed_countries: ALLOWED_COUNTRIES.iter().map(ToString::to_string).collect(),
        shipping_options: vec![
            ShippingOptionParams {
                display_name: "Standard Shipping".to_string(),
                amount: 500,
                currency: CURRENCY.to_string(),
                delivery_min_days: 3,
                delivery_max_days: 5,
            },
            ShippingOptionParams {
                display_name: "Express Shipping".to_string(),
                amount: 1500,
                currency: CURRENCY.to_string(),
                delivery_min_days: 1,
                delivery_max_days: 2,
            },
        ],
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use sugarplum_core::ProductId;

    use super::*;

    fn auth(user_id: &str) -> AuthState {
        // Minimal well-formed store token with a far-future expiry.
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({"id": user_id, "exp": i64::MAX / 2})
                .to_string()
                .as_bytes(),
        );
        AuthState::from_token(&format!("{header}.{payload}.sig")).unwrap()
    }

    fn line(id: &str, price: &str, promo: Option<&str>, quantity: u32) -> CartLine {
        CartLine {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            image: None,
            slug: None,
            price: price.parse().unwrap(),
            promo_price: promo.map(|p| p.parse().unwrap()),
            quantity,
        }
    }

    #[test]
    fn test_order_total_uses_promo_price() {
        let cart = vec![
            line("p1", "9.99", None, 2),
            line("p2", "30.00", Some("25.00"), 1),
        ];
        assert_eq!(order_total(&cart), "44.98".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_order_total_is_order_independent() {
        let mut cart = vec![
            line("p1", "9.99", None, 2),
            line("p2", "30.00", Some("25.00"), 1),
            line("p3", "0.05", None, 3),
        ];
        let forward = order_total(&cart);
        cart.reverse();
        assert_eq!(order_total(&cart), forward);
    }

    #[test]
    fn test_unit_amount_rounds_half_up() {
        let cart = vec![line("p1", "10.005", None, 1)];
        let params = build_session_params(&auth("u1"), &cart, None, "https://shop.test").unwrap();
        assert_eq!(params.line_items.first().unwrap().unit_amount, 1001);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let result = build_session_params(&auth("u1"), &[], None, "https://shop.test");
        assert!(matches!(result, Err(AppError::InvalidCart(_))));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let cart = vec![line("p1", "9.99", None, 0)];
        let result = build_session_params(&auth("u1"), &cart, None, "https://shop.test");
        assert!(matches!(result, Err(AppError::InvalidCart(_))));
    }

    #[test]
    fn test_zero_price_rejected() {
        let cart = vec![line("p1", "0", None, 1)];
        let result = build_session_params(&auth("u1"), &cart, None, "https://shop.test");
        assert!(matches!(result, Err(AppError::InvalidCart(_))));
    }

    #[test]
    fn test_metadata_bag_round_trips_order_intent() {
        let cart = vec![line("p1", "9.99", None, 2)];
        let params = build_session_params(&auth("u1"), &cart, None, "https://shop.test").unwrap();

        assert_eq!(params.metadata.get("userId").map(String::as_str), Some("u1"));
        assert_eq!(
            params.metadata.get("orderTotal").map(String::as_str),
            Some("19.98")
        );

        let items: Vec<OrderItemSummary> =
            serde_json::from_str(params.metadata.get("orderItems").unwrap()).unwrap();
        assert_eq!(items.len(), 1);
        let item = items.first().unwrap();
        assert_eq!(item.id, ProductId::new("p1"));
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_shipping_address_serialized_when_present() {
        let cart = vec![line("p1", "9.99", None, 1)];
        let address = ShippingAddress {
            name: "Jo".to_string(),
            line1: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
            ..ShippingAddress::default()
        };
        let params =
            build_session_params(&auth("u1"), &cart, Some(&address), "https://shop.test").unwrap();

        let round_tripped: ShippingAddress =
            serde_json::from_str(params.metadata.get("shippingAddress").unwrap()).unwrap();
        assert_eq!(round_tripped, address);
    }

    #[test]
    fn test_success_url_carries_session_placeholder() {
        let cart = vec![line("p1", "9.99", None, 1)];
        let params = build_session_params(&auth("u1"), &cart, None, "https://shop.test").unwrap();
        assert_eq!(
            params.success_url,
            "https://shop.test/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(params.cancel_url, "https://shop.test/checkout/cancel");
    }
}
