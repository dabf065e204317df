//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error renders as the JSON body
//! `{"error": {"message": "..."}}` expected by the browser-side checkout code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::datastore::DataStoreError;
use crate::stripe::StripeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout attempted without a valid authenticated session.
    #[error("You must be logged in to checkout")]
    Unauthenticated,

    /// Cart is empty or malformed (missing price/quantity).
    #[error("Cart is empty or invalid: {0}")]
    InvalidCart(String),

    /// Payment gateway rejected session creation.
    #[error("Failed to create checkout session: {0}")]
    GatewaySession(String),

    /// Webhook signature verification failed.
    #[error("Webhook signature verification failed")]
    SignatureInvalid,

    /// Webhook event is missing expected order metadata.
    #[error("Webhook event metadata corrupt: {0}")]
    MetadataCorrupt(String),

    /// A collection-store write in the reconciliation sequence failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DataStoreError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StripeError> for AppError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::SignatureInvalid(_) => Self::SignatureInvalid,
            other => Self::GatewaySession(other.to_string()),
        }
    }
}

impl AppError {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidCart(_)
            | Self::SignatureInvalid
            | Self::MetadataCorrupt(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::GatewaySession(_) | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::GatewaySession(_) | Self::Persistence(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Persistence(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({ "error": { "message": message } }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
