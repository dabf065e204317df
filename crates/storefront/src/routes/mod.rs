//! HTTP route handlers for the storefront server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (collection store probe)
//!
//! # Payment gateway API
//! GET  /api/stripe/config           - Publishable key + auth state
//! POST /api/stripe/create-checkout  - Create a hosted checkout session
//! POST /api/stripe/webhook          - Signed gateway callback (raw body)
//! ```

pub mod stripe;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the payment gateway API router.
pub fn stripe_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(stripe::config))
        .route("/create-checkout", post(stripe::create_checkout))
        .route("/webhook", post(stripe::webhook))
}

/// Create all routes for the storefront server.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api/stripe", stripe_routes())
}
