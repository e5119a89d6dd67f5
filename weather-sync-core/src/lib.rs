//! Weather Sync Core Library
//!
//! Mirrors a forecast feed into a remote list store: the list store and feed
//! clients, the sync orchestrator that appends feed records one at a time,
//! and the mapping from list items to display rows.

pub mod credential;
pub mod error;
pub mod feed;
pub mod forecast;
pub mod models;
pub mod store;
pub mod sync;
pub mod view;

#[cfg(test)]
mod test_support;

pub use credential::{AccessToken, StaticToken, TokenProvider};
pub use error::SyncError;
pub use feed::{FeedClient, FeedSource, FEED_PATH};
pub use forecast::{default_locations, ForecastCollector, Location};
pub use models::{FeedRecord, ListItem, TemperatureUnit};
pub use store::{ListStore, ListStoreClient};
pub use sync::{
    StatusMessage, SyncEvent, SyncObserver, SyncOrchestrator, SyncOutcome, SyncPhase, SyncReport,
    SyncSummary, Tone,
};
pub use view::{table_view, TableRow, TableView};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
