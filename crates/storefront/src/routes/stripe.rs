//! Payment gateway API routes.
//!
//! JSON endpoints consumed by the browser checkout code, plus the webhook
//! endpoint the gateway calls back asynchronously. The webhook handler reads
//! the raw body — signature verification runs over the exact bytes the
//! gateway signed, never over re-serialized JSON.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::datastore::AuthState;
use crate::error::{AppError, Result};
use crate::models::{CartLine, ShippingAddress};
use crate::services::{CheckoutService, CreatedCheckout, ReconcileService};
use crate::state::AppState;
use crate::stripe::StripeError;

/// Response for `GET /api/stripe/config`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfigResponse {
    /// Publishable key, safe to expose to browsers.
    pub public_key: String,
    pub is_logged_in: bool,
}

/// Request body for `POST /api/stripe/create-checkout`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub cart_items: Vec<CartLine>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

/// Extract auth state from the `Authorization` header, if any.
fn auth_state(headers: &HeaderMap) -> Option<AuthState> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    AuthState::from_header(header)
}

/// Publishable key and login state for the browser checkout code.
///
/// GET /api/stripe/config
pub async fn config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<GatewayConfigResponse> {
    Json(GatewayConfigResponse {
        public_key: state.config().stripe.public_key.clone(),
        is_logged_in: auth_state(&headers).is_some(),
    })
}

/// Create a hosted checkout session from the browser's cart snapshot.
///
/// POST /api/stripe/create-checkout
///
/// # Errors
///
/// - 401 `Unauthenticated` without a valid auth token (checked before
///   anything else — no gateway call is made)
/// - 400 `InvalidCart` for an empty or malformed cart
/// - 500 `GatewaySession` when the gateway rejects the session
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreatedCheckout>> {
    let auth = auth_state(&headers).ok_or(AppError::Unauthenticated)?;

    let request: CreateCheckoutRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidCart(format!("malformed request: {e}")))?;

    let checkout = CheckoutService::new(state.stripe(), &state.config().base_url);
    let created = checkout
        .create_session(&auth, &request.cart_items, request.shipping_address.as_ref())
        .await?;

    Ok(Json(created))
}

/// Signed gateway callback.
///
/// POST /api/stripe/webhook
///
/// Consumes the `stripe-signature` header and the raw body. Returns
/// `{"received": true}` once the event is handled (or deliberately ignored);
/// any reconciliation failure returns a non-2xx status so the gateway's own
/// redelivery policy retries the event later.
///
/// # Errors
///
/// - 400 `SignatureInvalid` when verification fails (zero writes occur)
/// - 400 `MetadataCorrupt` when a completed session lacks order metadata
/// - 500 `Persistence` when a collection-store write fails mid-sequence
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let event = state
        .stripe()
        .construct_event(&body, signature)
        .map_err(|e| match e {
            StripeError::SignatureInvalid(_) => AppError::SignatureInvalid,
            other => AppError::BadRequest(other.to_string()),
        })?;

    tracing::debug!(event_id = %event.id, event_kind = %event.kind, "webhook event verified");

    let reconciler = ReconcileService::new(state.datastore());
    reconciler.handle_event(&event).await?;

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}
