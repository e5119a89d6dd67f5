//! Sync the latest forecasts into the list.

use clap::Args;
use std::time::Duration;
use weather_sync_core::forecast::{DEFAULT_USER_AGENT, DEFAULT_WEATHER_API};
use weather_sync_core::{
    default_locations, FeedClient, FeedSource, ForecastCollector, ListStoreClient, StatusMessage,
    SyncEvent, SyncObserver, SyncOrchestrator, SyncReport, Tone,
};

use super::{print_items, CommandError, Credentials, OutputFormat};
use crate::config::Config;

/// Fetch the latest forecasts and append them to the list
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Seconds to pause after a failed append (overrides cooldown_secs)
    #[arg(long)]
    cooldown: Option<u64>,

    /// Query the weather service directly instead of the feed server
    #[arg(long)]
    direct: bool,
}

impl SyncCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let credentials = Credentials::from_config(config);
        if !credentials.ready().await? {
            return Err(CommandError::NotSignedIn);
        }

        let store = ListStoreClient::new(config.require_list_url()?, credentials.provider());
        let feed: Box<dyn FeedSource> = if self.direct {
            Box::new(ForecastCollector::new(
                DEFAULT_WEATHER_API,
                DEFAULT_USER_AGENT,
                default_locations(),
            ))
        } else {
            Box::new(FeedClient::new(config.feed_url.value.clone()))
        };

        let cooldown = self
            .cooldown
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.cooldown());

        let orchestrator = SyncOrchestrator::new(feed.as_ref(), &store).with_cooldown(cooldown);
        let mut printer = StatusPrinter;

        match orchestrator.run(&mut printer).await? {
            SyncReport::NoData => Ok(()),
            SyncReport::Completed { items, .. } => {
                println!();
                print_items(&items, &OutputFormat::Text)
            }
        }
    }
}

/// Prints each status line as the run progresses.
struct StatusPrinter;

impl SyncObserver for StatusPrinter {
    fn notify(&mut self, event: &SyncEvent) {
        if let Some(status) = event.status() {
            match status.tone {
                Tone::Error => eprintln!("{}", format_status(&status)),
                _ => println!("{}", format_status(&status)),
            }
        }
    }
}

fn format_status(status: &StatusMessage) -> String {
    let mark = match status.tone {
        Tone::Info => " ",
        Tone::Success => "✓",
        Tone::Warning => "!",
        Tone::Error => "✗",
    };
    format!("{} {}", mark, status.text)
}
