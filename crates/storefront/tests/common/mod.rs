//! Shared helpers for integration tests.
//!
//! Tests run the real router against wiremock servers standing in for the
//! payment gateway and the collection store.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use sha2::Sha256;

use sugarplum_storefront::config::{DataStoreConfig, StorefrontConfig, StripeConfig};
use sugarplum_storefront::routes;
use sugarplum_storefront::state::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_integration_test_secret";

/// Build a config pointing both hosted services at test servers.
pub fn test_config(gateway_url: &str, datastore_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        base_url: "https://shop.test".to_string(),
        stripe: StripeConfig {
            api_base: gateway_url.trim_end_matches('/').to_string(),
            secret_key: SecretString::from("sk_test_key"),
            public_key: "pk_test_key".to_string(),
            webhook_secret: SecretString::from(WEBHOOK_SECRET),
        },
        datastore: DataStoreConfig {
            base_url: datastore_url.trim_end_matches('/').to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Build the full application router over a test config.
pub fn test_app(gateway_url: &str, datastore_url: &str) -> Router {
    let state = AppState::new(test_config(gateway_url, datastore_url));
    routes::routes().with_state(state)
}

/// A well-formed store auth token with a far-future expiry.
pub fn auth_token(user_id: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"id": user_id, "exp": 4_102_444_800_i64, "type": "authRecord"})
            .to_string()
            .as_bytes(),
    );
    format!("{header}.{payload}.dGVzdC1zaWduYXR1cmU")
}

/// Sign a webhook payload the way the gateway does.
pub fn sign_payload(payload: &[u8], timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac key");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// POST a signed webhook delivery.
pub fn webhook_request(payload: &[u8], signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/stripe/webhook")
        .header("stripe-signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_vec()))
        .expect("request")
}

/// Read a JSON response body.
pub async fn json_body(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
