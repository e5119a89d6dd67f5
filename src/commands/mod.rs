mod auth;
mod config_cmd;
mod list;
mod sync_cmd;

pub use auth::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use list::ListCommand;
pub use sync_cmd::SyncCommand;

use clap::ValueEnum;
use std::sync::Arc;
use weather_sync_core::{table_view, ListItem, StaticToken, SyncError, TableView, TokenProvider};

use crate::config::{Config, ConfigError};
use crate::identity::{AuthSettings, IdentityClient, IdentityError, SessionStore};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Credentials for list store calls
pub enum Credentials {
    /// Token handed in through WXSYNC_ACCESS_TOKEN
    Static(Arc<StaticToken>),
    /// Signed-in account
    Identity(Arc<IdentityClient>),
}

impl Credentials {
    pub fn from_config(config: &Config) -> Self {
        match &config.access_token {
            Some(token) => Credentials::Static(Arc::new(StaticToken::new(token.clone()))),
            None => Credentials::Identity(Arc::new(identity_client(config))),
        }
    }

    /// True when list calls can be made, loading the cached account if needed.
    pub async fn ready(&self) -> Result<bool, IdentityError> {
        match self {
            Credentials::Static(_) => Ok(true),
            Credentials::Identity(identity) => identity.initialize().await,
        }
    }

    pub fn provider(&self) -> Arc<dyn TokenProvider> {
        match self {
            Credentials::Static(token) => token.clone() as Arc<dyn TokenProvider>,
            Credentials::Identity(identity) => identity.clone() as Arc<dyn TokenProvider>,
        }
    }
}

pub fn identity_client(config: &Config) -> IdentityClient {
    IdentityClient::new(
        AuthSettings::for_tenant(&config.tenant_id.value, config.client_id.value.clone()),
        SessionStore::new(config.session_path()),
    )
}

/// Prints the list as a table or JSON.
pub fn print_items(items: &[ListItem], format: &OutputFormat) -> Result<(), CommandError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items)
                .map_err(|e| CommandError::Output(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let view = table_view(items);
            print!("{}", view.render_text());
            if let TableView::Rows(rows) = &view {
                println!("\n{} item{}", rows.len(), if rows.len() == 1 { "" } else { "s" });
            }
        }
    }
    Ok(())
}

/// Errors from list and sync commands
#[derive(Debug)]
pub enum CommandError {
    Config(ConfigError),
    Identity(IdentityError),
    Sync(SyncError),
    NotSignedIn,
    Output(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Config(e) => write!(f, "{}", e),
            CommandError::Identity(e) => write!(f, "Error during initialization: {}", e),
            CommandError::Sync(e) => write!(f, "{}", e),
            CommandError::NotSignedIn => {
                write!(f, "Not signed in. Run 'wxsync auth login' first.")
            }
            CommandError::Output(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Config(e) => Some(e),
            CommandError::Identity(e) => Some(e),
            CommandError::Sync(e) => Some(e),
            CommandError::NotSignedIn | CommandError::Output(_) => None,
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        CommandError::Config(e)
    }
}

impl From<IdentityError> for CommandError {
    fn from(e: IdentityError) -> Self {
        CommandError::Identity(e)
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}
