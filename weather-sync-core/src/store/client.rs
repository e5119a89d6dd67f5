//! HTTP client for a SharePoint list exposed through Microsoft Graph.
//!
//! Every call fetches a bearer token from the token provider and makes
//! exactly one round trip (one per page when reading a paged collection).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Deserializer, Serialize};

use super::ListStore;
use crate::credential::TokenProvider;
use crate::error::SyncError;
use crate::models::{FeedRecord, ListItem};

/// Collection page returned by `GET {list}?expand=fields`.
#[derive(Debug, Deserialize)]
struct ItemPage {
    value: Vec<StoreItem>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// A single item as the store returns it.
#[derive(Debug, Deserialize)]
struct StoreItem {
    id: String,
    #[serde(default)]
    fields: StoreFields,
}

/// Column values under the store's native names.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct StoreFields {
    title: Option<String>,
    name: Option<String>,
    #[serde(deserialize_with = "number_or_text")]
    temperature: Option<f64>,
    temperature_unit: Option<String>,
    short_forecast: Option<String>,
    date_time: Option<String>,
}

/// Body of a create request.
#[derive(Debug, Serialize)]
struct CreateItem<'a> {
    fields: &'a FeedRecord,
}

impl From<StoreItem> for ListItem {
    fn from(item: StoreItem) -> Self {
        let fields = item.fields;
        ListItem {
            id: item.id,
            location: fields.title,
            forecast_period: fields.name,
            temperature: fields.temperature,
            unit: fields.temperature_unit,
            forecast: fields.short_forecast,
            date_time: fields.date_time,
        }
    }
}

/// Number columns come back as JSON numbers, but text columns holding a
/// number are common in hand-built lists.
fn number_or_text<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// List store client bound to one list URL.
#[derive(Clone)]
pub struct ListStoreClient {
    list_url: String,
    tokens: Arc<dyn TokenProvider>,
    http: reqwest::Client,
}

impl ListStoreClient {
    /// Creates a client for `list_url`, e.g.
    /// `https://graph.microsoft.com/v1.0/sites/{site}/lists/{list}/items`.
    pub fn new(list_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            list_url: list_url.into().trim_end_matches('/').to_string(),
            tokens,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the list URL.
    pub fn list_url(&self) -> &str {
        &self.list_url
    }

    async fn fetch_page(&self, request: reqwest::RequestBuilder) -> Result<ItemPage, SyncError> {
        let token = self.tokens.get_token().await?;

        let response = request
            .header(AUTHORIZATION, token.bearer())
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        if !response.status().is_success() {
            return Err(SyncError::from_response(response).await);
        }

        let body = response.text().await.map_err(SyncError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ListStore for ListStoreClient {
    async fn read_all(&self) -> Result<Vec<ListItem>, SyncError> {
        let first = self
            .http
            .get(&self.list_url)
            .query(&[("expand", "fields")]);
        let mut page = self.fetch_page(first).await?;
        let mut items: Vec<ListItem> = page.value.drain(..).map(ListItem::from).collect();

        while let Some(next) = page.next_link.take() {
            tracing::debug!("Following list page link {}", next);
            page = self.fetch_page(self.http.get(&next)).await?;
            items.extend(page.value.drain(..).map(ListItem::from));
        }

        tracing::debug!("Read {} item(s) from list store", items.len());
        Ok(items)
    }

    async fn append(&self, record: &FeedRecord) -> Result<ListItem, SyncError> {
        let token = self.tokens.get_token().await?;

        let response = self
            .http
            .post(&self.list_url)
            .header(AUTHORIZATION, token.bearer())
            .json(&CreateItem { fields: record })
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        if !response.status().is_success() {
            return Err(SyncError::from_response(response).await);
        }

        let body = response.text().await.map_err(SyncError::from_transport)?;
        let created: StoreItem = serde_json::from_str(&body)?;
        Ok(created.into())
    }
}
