//! Hosted collection store client.
//!
//! Typed CRUD over the store's REST API
//! (`/api/collections/{name}/records`). The store owns all persistence and
//! auth; this system only orchestrates writes against it. Each create call is
//! independently atomic, but there is no cross-call transaction — callers
//! that need consistency must order their writes (see
//! `services::reconcile`).

pub mod auth;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::config::DataStoreConfig;

pub use auth::AuthState;

/// Collection names used by the storefront.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const ORDER_ITEMS: &str = "orderItems";
    pub const PAYMENTS: &str = "payments";
    pub const SHIPPING_ADDRESSES: &str = "shippingAddresses";
}

/// Errors that can occur when interacting with the collection store.
#[derive(Debug, Error)]
pub enum DataStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No record matched the filter.
    #[error("no record in '{collection}' matching: {filter}")]
    NotFound { collection: String, filter: String },

    /// Failed to parse a store response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A persisted record. Only `id` is strongly typed; the remaining fields stay
/// schemaless because collection schemas live in the store, not here.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Paged list response from the store.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<R> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub items: Vec<R>,
}

/// Optional query parameters for list operations.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub expand: Option<String>,
}

/// Client for the hosted collection store.
#[derive(Clone)]
pub struct DataStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl DataStoreClient {
    /// Create a new collection store client from configuration.
    #[must_use]
    pub fn new(config: &DataStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{collection}/records", self.base_url)
    }

    async fn check<R: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, DataStoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| DataStoreError::Parse(e.to_string()))
    }

    /// Create a record in a collection.
    ///
    /// # Errors
    ///
    /// Returns `DataStoreError::Api` when the store rejects the write (for
    /// example a failed validation rule or a missing referenced record).
    #[instrument(skip(self, fields))]
    pub async fn create<R: DeserializeOwned>(
        &self,
        collection: &str,
        fields: &impl Serialize,
    ) -> Result<R, DataStoreError> {
        let response = self
            .client
            .post(self.records_url(collection))
            .json(fields)
            .send()
            .await?;

        Self::check(response).await
    }

    /// Fetch a single record by ID.
    ///
    /// # Errors
    ///
    /// Returns `DataStoreError::Api` (404 from the store) if the record does
    /// not exist.
    pub async fn get_one<R: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        expand: Option<&str>,
    ) -> Result<R, DataStoreError> {
        let mut request = self
            .client
            .get(format!("{}/{id}", self.records_url(collection)));
        if let Some(expand) = expand {
            request = request.query(&[("expand", expand)]);
        }

        Self::check(request.send().await?).await
    }

    /// Fetch a page of records.
    ///
    /// # Errors
    ///
    /// Returns `DataStoreError::Api` on a non-success response.
    pub async fn get_list<R: DeserializeOwned>(
        &self,
        collection: &str,
        page: u32,
        per_page: u32,
        query: &ListQuery,
    ) -> Result<ListResult<R>, DataStoreError> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
        ];
        if let Some(filter) = &query.filter {
            params.push(("filter", filter.clone()));
        }
        if let Some(sort) = &query.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(expand) = &query.expand {
            params.push(("expand", expand.clone()));
        }

        let response = self
            .client
            .get(self.records_url(collection))
            .query(&params)
            .send()
            .await?;

        Self::check(response).await
    }

    /// Fetch the first record matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `DataStoreError::NotFound` when nothing matches.
    pub async fn get_first_list_item<R: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &str,
    ) -> Result<R, DataStoreError> {
        let query = ListQuery {
            filter: Some(filter.to_string()),
            ..ListQuery::default()
        };
        let mut list: ListResult<R> = self.get_list(collection, 1, 1, &query).await?;

        match list.items.pop() {
            Some(record) => Ok(record),
            None => Err(DataStoreError::NotFound {
                collection: collection.to_string(),
                filter: filter.to_string(),
            }),
        }
    }

    /// Delete a record by ID.
    ///
    /// # Errors
    ///
    /// Returns `DataStoreError::Api` on a non-success response.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), DataStoreError> {
        let response = self
            .client
            .delete(format!("{}/{id}", self.records_url(collection)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DataStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Liveness probe against the store's health endpoint.
    ///
    /// # Errors
    ///
    /// Returns `DataStoreError` when the store is unreachable or unhealthy.
    pub async fn health_check(&self) -> Result<(), DataStoreError> {
        let response = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DataStoreError::Api {
                status: status.as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_flattens_extra_fields() {
        let json = r#"{"id":"r1","amount":24.98,"status":"completed"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "r1");
        assert_eq!(
            record.fields.get("status").and_then(|v| v.as_str()),
            Some("completed")
        );
    }

    #[test]
    fn test_list_result_camel_case() {
        let json = r#"{"page":1,"perPage":30,"totalItems":2,"items":[{"id":"a"},{"id":"b"}]}"#;
        let list: ListResult<Record> = serde_json::from_str(json).unwrap();
        assert_eq!(list.per_page, 30);
        assert_eq!(list.items.len(), 2);
    }
}
