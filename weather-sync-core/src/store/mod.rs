//! Remote list store.
//!
//! The store is append-only from this crate's point of view: items are read
//! and created, never updated or deleted. Repeated syncs of the same feed
//! therefore create duplicate rows unless the store itself enforces unique
//! column values, in which case the second append is rejected with a
//! `Remote` error and counted as a failed record.

mod client;

pub use client::ListStoreClient;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::{FeedRecord, ListItem};

/// Read and append operations against the list store.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Reads the full collection.
    async fn read_all(&self) -> Result<Vec<ListItem>, SyncError>;

    /// Creates a new item from `record`. Never updates an existing one.
    async fn append(&self, record: &FeedRecord) -> Result<ListItem, SyncError>;
}
