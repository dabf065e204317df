//! Payment gateway client (hosted checkout sessions + signed webhooks).
//!
//! The gateway is stateless from this system's perspective: the only linkage
//! between creating a session and the later webhook delivery is the metadata
//! bag echoed back on the event.

pub mod types;
pub mod webhook;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::StripeConfig;

pub use types::{
    CheckoutSession, CheckoutSessionParams, CompletedSession, Event, EventAddress, LineItemParams,
    ShippingCost, ShippingDetails, ShippingOptionParams,
};
pub use webhook::verify_signature;

/// Event kind that triggers order reconciliation.
pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Event kind that is acknowledged and logged only.
pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Webhook signature verification failed.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Failed to parse a gateway response or event payload.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Error body shape returned by the gateway API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Client for the payment gateway REST API.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    webhook_secret: SecretString,
}

impl StripeClient {
    /// Create a new gateway client from configuration.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Create a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Api`] with the gateway's message when the
    /// session is rejected, [`StripeError::Http`] on transport failure.
    #[instrument(skip(self, params), fields(line_items = params.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params.to_form())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))?;

        tracing::debug!(session_id = %session.id, "checkout session created");
        Ok(session)
    }

    /// Verify a webhook delivery and parse it into an [`Event`].
    ///
    /// Must be called with the raw request body; parsing the body before
    /// verification would break the signature.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::SignatureInvalid`] on verification failure and
    /// [`StripeError::Parse`] if the verified payload is not a valid event.
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<Event, StripeError> {
        webhook::verify_signature(payload, signature_header, self.webhook_secret.expose_secret())?;

        serde_json::from_slice(payload).map_err(|e| StripeError::Parse(e.to_string()))
    }
}
