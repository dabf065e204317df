//! Sugarplum Storefront - checkout and reconciliation server.
//!
//! Serves the payment API the browser storefront talks to. The server owns
//! no storage of its own: records live in a hosted collection store, and
//! payment runs on a hosted gateway reached via REST plus signed webhook
//! callbacks. Everything interesting happens on the checkout-session →
//! webhook-reconciliation path.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Modules are compiled into both the binary and the library; client API
// surface exercised only via the library/tests is dead in the binary target
#![allow(dead_code)]

mod config;
mod datastore;
mod error;
mod models;
mod routes;
mod services;
mod state;
mod stripe;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::StorefrontConfig;
use state::AppState;

/// Set up Sentry when a DSN is configured. The returned guard must outlive
/// the server so buffered events flush on shutdown.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Map tracing levels onto Sentry: warnings and errors become events,
/// info/debug become breadcrumbs attached to them.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Config first: Sentry init needs the DSN before any subscriber exists
    let config = StorefrontConfig::from_env().expect("configuration error");
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sugarplum_storefront=info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Both hosted-service clients are built exactly once here and travel
    // through AppState; nothing else constructs one
    let state = AppState::new(config.clone());

    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers go outermost so they see every request
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!(%addr, "storefront listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

/// Liveness probe; says nothing about dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: 503 until the collection store answers its health
/// endpoint, so load balancers hold traffic while the store is down.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.datastore().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
