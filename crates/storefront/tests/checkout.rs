//! Checkout endpoint integration tests.
//!
//! Drives the real router against a wiremock payment gateway, asserting the
//! session request shape and the validation-before-gateway contract.

#![allow(clippy::unwrap_used)]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{auth_token, json_body, test_app};

fn checkout_request(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/stripe/create-checkout")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn widget_cart() -> serde_json::Value {
    json!({
        "cartItems": [
            {"id": "p1", "name": "Widget", "price": 9.99, "quantity": 2}
        ]
    })
}

#[tokio::test]
async fn config_reports_public_key_and_login_state() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;

    let app = test_app(&gateway.uri(), &store.uri());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/stripe/config")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "publicKey": "pk_test_key", "isLoggedIn": false }));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stripe/config")
                .header("authorization", format!("Bearer {}", auth_token("u1")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, body) = json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isLoggedIn"], true);
}

#[tokio::test]
async fn unauthenticated_checkout_is_rejected_before_gateway_call() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&gateway)
        .await;

    let app = test_app(&gateway.uri(), &store.uri());
    let response = app
        .oneshot(checkout_request(None, widget_cart()))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&gateway)
        .await;

    use base64::Engine;
    let header_part =
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
    let payload_part = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .encode(json!({"id": "u1", "exp": 1}).to_string().as_bytes());
    let expired = format!("{header_part}.{payload_part}.sig");

    let app = test_app(&gateway.uri(), &store.uri());
    let response = app
        .oneshot(checkout_request(Some(&expired), widget_cart()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_cart_is_rejected_before_gateway_call() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&gateway)
        .await;

    let app = test_app(&gateway.uri(), &store.uri());
    let token = auth_token("u1");
    let response = app
        .oneshot(checkout_request(Some(&token), json!({"cartItems": []})))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;

    let app = test_app(&gateway.uri(), &store.uri());
    let request = Request::builder()
        .method("POST")
        .uri("/api/stripe/create-checkout")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", auth_token("u1")))
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn successful_checkout_returns_session_id_and_url() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_42",
            "url": "https://gateway.test/pay/cs_test_42"
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let app = test_app(&gateway.uri(), &store.uri());
    let token = auth_token("u1");
    let response = app
        .oneshot(checkout_request(Some(&token), widget_cart()))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "sessionId": "cs_test_42",
            "url": "https://gateway.test/pay/cs_test_42"
        })
    );

    // Form-encoded session request carries line items and the metadata bag
    let requests = gateway.received_requests().await.unwrap();
    let form = String::from_utf8(requests.first().unwrap().body.clone()).unwrap();
    assert!(form.contains("mode=payment"));
    assert!(form.contains("line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=999"));
    assert!(form.contains("line_items%5B0%5D%5Bquantity%5D=2"));
    assert!(form.contains("metadata%5BuserId%5D=u1"));
    assert!(form.contains("metadata%5BorderTotal%5D=19.98"));
}

#[tokio::test]
async fn gateway_rejection_surfaces_as_server_error() {
    let gateway = MockServer::start().await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid currency: xyz"}
        })))
        .mount(&gateway)
        .await;

    let app = test_app(&gateway.uri(), &store.uri());
    let token = auth_token("u1");
    let response = app
        .oneshot(checkout_request(Some(&token), widget_cart()))
        .await
        .unwrap();
    let (status, body) = json_body(response).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Invalid currency")
    );
}
