//! Sequential replication of a feed batch into the list store.

use std::time::Duration;

use super::status::{SyncEvent, SyncOutcome, SyncPhase, SyncSummary};
use crate::error::SyncError;
use crate::feed::FeedSource;
use crate::models::ListItem;
use crate::store::ListStore;

/// Pause after a failed append so the error stays on screen for a moment.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Receives every event of a run, in order.
pub trait SyncObserver: Send {
    fn notify(&mut self, event: &SyncEvent);
}

impl<F> SyncObserver for F
where
    F: FnMut(&SyncEvent) + Send,
{
    fn notify(&mut self, event: &SyncEvent) {
        self(event)
    }
}

/// Outcome of one record, labelled for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    pub label: String,
    pub outcome: SyncOutcome,
}

/// How a run that was not aborted ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReport {
    /// The feed returned an empty batch
    NoData,
    Completed {
        summary: SyncSummary,
        results: Vec<RecordResult>,
        /// Store contents after the run
        items: Vec<ListItem>,
    },
}

impl SyncReport {
    pub fn summary(&self) -> Option<&SyncSummary> {
        match self {
            SyncReport::NoData => None,
            SyncReport::Completed { summary, .. } => Some(summary),
        }
    }
}

/// Drives one sync run: fetch, append each record, refresh.
///
/// Records are appended strictly one at a time. A failed append is tallied,
/// reported, followed by the cooldown pause and never retried. A failed
/// fetch or refresh aborts the run with that error. Items appended before an
/// abort stay appended.
pub struct SyncOrchestrator<'a> {
    feed: &'a dyn FeedSource,
    store: &'a dyn ListStore,
    cooldown: Duration,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(feed: &'a dyn FeedSource, store: &'a dyn ListStore) -> Self {
        Self {
            feed,
            store,
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Sets the pause taken after each failed append. Zero disables it.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Runs a fresh sync from `Idle`.
    pub async fn run(&self, observer: &mut dyn SyncObserver) -> Result<SyncReport, SyncError> {
        observer.notify(&SyncEvent::Phase(SyncPhase::Idle));
        observer.notify(&SyncEvent::Phase(SyncPhase::Fetching));

        let records = match self.feed.fetch_latest().await {
            Ok(records) => records,
            Err(e) => return Err(abort(observer, e)),
        };

        if records.is_empty() {
            tracing::info!("Feed returned no records, nothing to sync");
            observer.notify(&SyncEvent::NoData);
            observer.notify(&SyncEvent::Phase(SyncPhase::Done));
            return Ok(SyncReport::NoData);
        }

        let total = records.len();
        observer.notify(&SyncEvent::Started { total });

        let mut summary = SyncSummary::new(total);
        let mut results = Vec::with_capacity(total);

        for (index, record) in records.iter().enumerate() {
            observer.notify(&SyncEvent::Phase(SyncPhase::Syncing { index, total }));

            let outcome = match self.store.append(record).await {
                Ok(item) => {
                    tracing::debug!("Appended {} as item {}", record.label(), item.id);
                    SyncOutcome::Succeeded
                }
                Err(e) => {
                    tracing::warn!("Failed to sync {}: {}", record.label(), e);
                    observer.notify(&SyncEvent::RecordFailed {
                        label: record.label().to_string(),
                        error: e.clone(),
                    });
                    if !self.cooldown.is_zero() {
                        tokio::time::sleep(self.cooldown).await;
                    }
                    SyncOutcome::Failed(e)
                }
            };

            summary.record(&outcome);
            results.push(RecordResult {
                label: record.label().to_string(),
                outcome,
            });

            observer.notify(&SyncEvent::Progress {
                processed: summary.processed_count,
                total,
            });
        }

        tracing::info!(
            "Sync finished: {} added, {} failed",
            summary.success_count,
            summary.fail_count
        );
        observer.notify(&SyncEvent::Finished(summary));

        observer.notify(&SyncEvent::Phase(SyncPhase::Refreshing));
        let items = match self.store.read_all().await {
            Ok(items) => items,
            Err(e) => return Err(abort(observer, e)),
        };

        observer.notify(&SyncEvent::Phase(SyncPhase::Done));
        Ok(SyncReport::Completed {
            summary,
            results,
            items,
        })
    }
}

fn abort(observer: &mut dyn SyncObserver, error: SyncError) -> SyncError {
    tracing::error!("Sync aborted: {}", error);
    observer.notify(&SyncEvent::Phase(SyncPhase::Aborted(error.clone())));
    error
}
