//! Run phases, progress events and the status lines derived from them.

use std::fmt;

use crate::error::SyncError;

/// Colour hint for a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

/// A human-readable status line for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Info)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Error)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Where a sync run currently is.
///
/// `Idle → Fetching → Syncing → Refreshing → Done`, or `Aborted` from
/// `Fetching`/`Refreshing`. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    /// Appending record `index` (0-based) of `total`
    Syncing { index: usize, total: usize },
    Refreshing,
    Done,
    Aborted(SyncError),
}

impl SyncPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Aborted(_))
    }
}

/// Result of appending one record.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Succeeded,
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Succeeded)
    }
}

/// Tally of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub processed_count: usize,
    pub total: usize,
}

impl SyncSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &SyncOutcome) {
        if outcome.is_success() {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
        self.processed_count += 1;
    }

    /// Final status line, e.g. "Sync complete! 2 added. 1 failed."
    pub fn message(&self) -> StatusMessage {
        let mut text = format!("Sync complete! {} added.", self.success_count);
        if self.fail_count > 0 {
            text.push_str(&format!(" {} failed.", self.fail_count));
            StatusMessage::new(text, Tone::Warning)
        } else {
            StatusMessage::new(text, Tone::Success)
        }
    }
}

/// Everything an observer hears about during a run, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Phase(SyncPhase),
    /// The feed returned nothing; the run ends without touching the store
    NoData,
    /// Appending started for a batch of `total` records
    Started { total: usize },
    RecordFailed { label: String, error: SyncError },
    Progress { processed: usize, total: usize },
    Finished(SyncSummary),
}

impl SyncEvent {
    /// Status line for this event, if it warrants one.
    pub fn status(&self) -> Option<StatusMessage> {
        match self {
            SyncEvent::Phase(SyncPhase::Fetching) => Some(StatusMessage::info(
                "Fetching latest weather data from server...",
            )),
            SyncEvent::Phase(SyncPhase::Refreshing) => {
                Some(StatusMessage::info("Loading weather data from the list..."))
            }
            SyncEvent::Phase(SyncPhase::Aborted(e)) => {
                Some(StatusMessage::error(format!("Sync Error: {}", e)))
            }
            SyncEvent::Phase(_) => None,
            SyncEvent::NoData => Some(StatusMessage::info(
                "Server did not return any weather data.",
            )),
            SyncEvent::Started { total } => Some(StatusMessage::info(format!(
                "Syncing {} locations to the list...",
                total
            ))),
            SyncEvent::RecordFailed { label, error } => Some(StatusMessage::error(format!(
                "Error syncing {}: {}",
                label, error
            ))),
            SyncEvent::Progress { processed, total } => Some(StatusMessage::info(format!(
                "Syncing... ({}/{} locations processed)",
                processed, total
            ))),
            SyncEvent::Finished(summary) => Some(summary.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_message_all_succeeded() {
        let mut summary = SyncSummary::new(2);
        summary.record(&SyncOutcome::Succeeded);
        summary.record(&SyncOutcome::Succeeded);

        let msg = summary.message();
        assert_eq!(msg.text, "Sync complete! 2 added.");
        assert_eq!(msg.tone, Tone::Success);
    }

    #[test]
    fn test_summary_message_with_failures() {
        let mut summary = SyncSummary::new(3);
        summary.record(&SyncOutcome::Succeeded);
        summary.record(&SyncOutcome::Failed(SyncError::Http("reset".into())));
        summary.record(&SyncOutcome::Succeeded);

        assert_eq!(summary.processed_count, 3);
        assert_eq!(summary.success_count + summary.fail_count, 3);

        let msg = summary.message();
        assert_eq!(msg.text, "Sync complete! 2 added. 1 failed.");
        assert_eq!(msg.tone, Tone::Warning);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(SyncPhase::Done.is_terminal());
        assert!(SyncPhase::Aborted(SyncError::Decode("x".into())).is_terminal());
        assert!(!SyncPhase::Idle.is_terminal());
        assert!(!SyncPhase::Syncing { index: 0, total: 1 }.is_terminal());
    }

    #[test]
    fn test_event_status_lines() {
        assert_eq!(
            SyncEvent::Progress {
                processed: 2,
                total: 5
            }
            .status()
            .unwrap()
            .text,
            "Syncing... (2/5 locations processed)"
        );

        let failed = SyncEvent::RecordFailed {
            label: "Chicago, IL".to_string(),
            error: SyncError::Remote {
                status: 409,
                body: "duplicate".to_string(),
            },
        }
        .status()
        .unwrap();
        assert_eq!(failed.tone, Tone::Error);
        assert_eq!(
            failed.text,
            "Error syncing Chicago, IL: Remote error (409): duplicate"
        );

        assert!(SyncEvent::Phase(SyncPhase::Done).status().is_none());
    }
}
