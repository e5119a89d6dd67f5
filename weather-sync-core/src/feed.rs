//! Client for the feed endpoint that serves the latest forecast batch.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::FeedRecord;

/// Path of the feed endpoint relative to the feed server's base URL.
pub const FEED_PATH: &str = "/api/syncWeather";

/// Source of feed batches.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the whole batch or fails; there are no partial results.
    async fn fetch_latest(&self) -> Result<Vec<FeedRecord>, SyncError>;
}

/// Unauthenticated HTTP client for the feed endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    base_url: String,
    http: reqwest::Client,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Full URL of the feed endpoint.
    pub fn feed_url(&self) -> String {
        format!("{}{}", self.base_url, FEED_PATH)
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_latest(&self) -> Result<Vec<FeedRecord>, SyncError> {
        let response = self
            .http
            .get(self.feed_url())
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        if !response.status().is_success() {
            return Err(SyncError::from_response(response).await);
        }

        let body = response.text().await.map_err(SyncError::from_transport)?;
        let records: Vec<FeedRecord> = serde_json::from_str(&body)?;
        tracing::debug!("Feed returned {} record(s)", records.len());
        Ok(records)
    }
}
