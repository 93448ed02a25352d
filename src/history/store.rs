//! Read access to the persisted posture history.
//!
//! The store is a PostgREST endpoint (as exposed by Supabase). Only one query
//! is ever issued: the most recent N rows by `created_at`, newest first.
//!
//! ## Example
//!
//! ```rust,no_run
//! use posture_pulse::history::{HistoryStore, RestHistoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RestHistoryStore::builder()
//!         .endpoint("https://example.supabase.co")
//!         .api_key("public-anon-key")
//!         .build()?;
//!
//!     for record in store.fetch_recent(100).await? {
//!         println!("{} {:.1}°", record.created_at, record.pitch);
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::HistorySettings;
use crate::data::HistoricalRecord;
use crate::error::{Error, Result};

/// Source of persisted posture records.
#[async_trait]
pub trait HistoryStore: Send + Sync + Debug {
    /// Fetch up to `limit` records ordered by creation time, newest first.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<HistoricalRecord>>;

    /// Human-readable location of the store.
    fn description(&self) -> &str;
}

/// History store backed by the PostgREST HTTP API.
#[derive(Debug, Clone)]
pub struct RestHistoryStore {
    client: Client,
    endpoint: String,
    api_key: String,
    table: String,
    description: String,
}

impl RestHistoryStore {
    /// Create a new builder for configuring the store.
    pub fn builder() -> RestHistoryStoreBuilder {
        RestHistoryStoreBuilder::default()
    }

    /// Build a store from the `[history]` settings section.
    pub fn from_settings(settings: &HistorySettings) -> Result<Self> {
        Self::builder()
            .endpoint(&settings.url)
            .api_key(&settings.api_key)
            .table(&settings.table)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.endpoint, self.table)
    }
}

#[async_trait]
impl HistoryStore for RestHistoryStore {
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<HistoricalRecord>> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.table_url())
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let records: Vec<HistoricalRecord> = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("invalid response body: {}", e)))?;

        debug!("Fetched {} history records", records.len());
        Ok(records)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`RestHistoryStore`].
#[derive(Debug, Default)]
pub struct RestHistoryStoreBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    table: Option<String>,
    timeout: Option<Duration>,
}

impl RestHistoryStoreBuilder {
    /// Project base URL, without the `/rest/v1` suffix.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Public API key, sent as both `apikey` and bearer token.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Table name (default: "posture_history").
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RestHistoryStore> {
        let endpoint = self
            .endpoint
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Config("history endpoint is not set".to_string()))?;
        let table = self.table.unwrap_or_else(|| "posture_history".to_string());

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .build()?;

        Ok(RestHistoryStore {
            client,
            description: format!("{}/{}", endpoint, table),
            endpoint,
            api_key: self.api_key.unwrap_or_default(),
            table,
        })
    }
}
