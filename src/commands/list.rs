//! Show the current contents of the list.

use clap::Args;
use weather_sync_core::{ListItem, ListStore, ListStoreClient};

use super::{print_items, CommandError, Credentials, OutputFormat};
use crate::config::Config;

/// Show the weather data currently in the list
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ListCommand {
    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        let credentials = Credentials::from_config(config);
        let store = ListStoreClient::new(config.require_list_url()?, credentials.provider());

        match load_items(&credentials, &store).await? {
            Some(items) => print_items(&items, &self.format),
            None => Err(CommandError::NotSignedIn),
        }
    }
}

/// Reads the list once signed in. Returns `None`, without touching the store,
/// when there is no account.
pub async fn load_items(
    credentials: &Credentials,
    store: &dyn ListStore,
) -> Result<Option<Vec<ListItem>>, CommandError> {
    if !credentials.ready().await? {
        return Ok(None);
    }
    Ok(Some(store.read_all().await?))
}
