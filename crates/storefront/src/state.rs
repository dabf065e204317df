//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::datastore::DataStoreClient;
use crate::stripe::StripeClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the external-service clients. Both clients are
/// constructed exactly once here and injected everywhere else — no
/// module-level singletons.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stripe: StripeClient,
    datastore: DataStoreClient,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let stripe = StripeClient::new(&config.stripe);
        let datastore = DataStoreClient::new(&config.datastore);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                stripe,
                datastore,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn stripe(&self) -> &StripeClient {
        &self.inner.stripe
    }

    /// Get a reference to the collection store client.
    #[must_use]
    pub fn datastore(&self) -> &DataStoreClient {
        &self.inner.datastore
    }
}
