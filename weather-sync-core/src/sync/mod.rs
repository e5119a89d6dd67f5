//! Sync run: fetch a feed batch, append it to the list store one record at a
//! time, then re-read the store.

mod orchestrator;
mod status;

pub use orchestrator::{
    RecordResult, SyncObserver, SyncOrchestrator, SyncReport, DEFAULT_COOLDOWN,
};
pub use status::{StatusMessage, SyncEvent, SyncOutcome, SyncPhase, SyncSummary, Tone};
