use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

pub const DEFAULT_FEED_URL: &str = "http://localhost:8080";
pub const DEFAULT_TENANT_ID: &str = "common";
pub const DEFAULT_COOLDOWN_SECS: u64 = 5;

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Graph URL of the list's items collection
    pub list_url: ConfigValue<Option<String>>,
    /// Base URL of the feed server
    pub feed_url: ConfigValue<String>,
    /// Directory (tenant) ID used to build the authority
    pub tenant_id: ConfigValue<String>,
    /// Application (client) ID registered with the identity platform
    pub client_id: ConfigValue<Option<String>>,
    /// Pause after a failed append, in seconds
    pub cooldown_secs: ConfigValue<u64>,
    /// Where the signed-in session is cached
    pub data_dir: ConfigValue<PathBuf>,
    /// Static bearer token that bypasses sign-in (environment only)
    #[serde(skip)]
    pub access_token: Option<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    list_url: Option<String>,
    feed_url: Option<String>,
    tenant_id: Option<String>,
    client_id: Option<String>,
    cooldown_secs: Option<u64>,
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut list_url = ConfigValue::new(None, ConfigSource::Default);
        let mut feed_url = ConfigValue::new(DEFAULT_FEED_URL.to_string(), ConfigSource::Default);
        let mut tenant_id = ConfigValue::new(DEFAULT_TENANT_ID.to_string(), ConfigSource::Default);
        let mut client_id = ConfigValue::new(None, ConfigSource::Default);
        let mut cooldown_secs = ConfigValue::new(DEFAULT_COOLDOWN_SECS, ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.list_url {
                list_url = ConfigValue::new(Some(url), ConfigSource::File);
            }
            if let Some(url) = file_config.feed_url {
                feed_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(tenant) = file_config.tenant_id {
                tenant_id = ConfigValue::new(tenant, ConfigSource::File);
            }
            if let Some(client) = file_config.client_id {
                client_id = ConfigValue::new(Some(client), ConfigSource::File);
            }
            if let Some(secs) = file_config.cooldown_secs {
                cooldown_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(url) = std::env::var("WXSYNC_LIST_URL") {
            list_url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("WXSYNC_FEED_URL") {
            feed_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(tenant) = std::env::var("WXSYNC_TENANT_ID") {
            tenant_id = ConfigValue::new(tenant, ConfigSource::Environment);
        }
        if let Ok(client) = std::env::var("WXSYNC_CLIENT_ID") {
            client_id = ConfigValue::new(Some(client), ConfigSource::Environment);
        }
        if let Ok(secs) = std::env::var("WXSYNC_COOLDOWN_SECS") {
            let secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("WXSYNC_COOLDOWN_SECS", secs))?;
            cooldown_secs = ConfigValue::new(secs, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("WXSYNC_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        let access_token = std::env::var("WXSYNC_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Ok(Self {
            list_url,
            feed_url,
            tenant_id,
            client_id,
            cooldown_secs,
            data_dir,
            access_token,
            config_file,
        })
    }

    /// Cooldown as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs.value)
    }

    /// Returns the list URL or an error explaining how to set it
    pub fn require_list_url(&self) -> Result<&str, ConfigError> {
        self.list_url
            .value
            .as_deref()
            .ok_or(ConfigError::Missing("list_url", "WXSYNC_LIST_URL"))
    }

    /// Returns the client ID or an error explaining how to set it
    pub fn require_client_id(&self) -> Result<&str, ConfigError> {
        self.client_id
            .value
            .as_deref()
            .ok_or(ConfigError::Missing("client_id", "WXSYNC_CLIENT_ID"))
    }

    /// Path of the cached sign-in session
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.value.join("session.json")
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/wxsync/
    /// - macOS: ~/Library/Application Support/wxsync/
    /// - Windows: %APPDATA%/wxsync/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wxsync")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/wxsync/
    /// - macOS: ~/Library/Application Support/wxsync/
    /// - Windows: %APPDATA%/wxsync/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wxsync")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
    Missing(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
            ConfigError::Missing(key, env) => write!(
                f,
                "{} is not configured. Set {} in the config file or {} in the environment.",
                key, key, env
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
