use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::{Config, ConfigValue};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# wxsync configuration

# Graph URL of the list's items collection
# list_url: https://graph.microsoft.com/v1.0/sites/YOUR_SITE/lists/YOUR_LIST_ID/items

# Base URL of the feed server (wxsync-feed)
feed_url: http://localhost:8080

# Directory (tenant) ID and Application (client) ID
tenant_id: common
# client_id: YOUR_CLIENT_ID

# Seconds to pause after a failed append
cooldown_secs: 5
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        print_value("list_url", &config.list_url, |v| {
                            v.clone().unwrap_or_else(|| "(not set)".to_string())
                        });
                        print_value("feed_url", &config.feed_url, |v| v.clone());
                        print_value("tenant_id", &config.tenant_id, |v| v.clone());
                        print_value("client_id", &config.client_id, |v| {
                            v.clone().unwrap_or_else(|| "(not set)".to_string())
                        });
                        print_value("cooldown_secs", &config.cooldown_secs, |v| v.to_string());
                        print_value("data_dir", &config.data_dir, |v| {
                            v.display().to_string()
                        });

                        if config.access_token.is_some() {
                            println!("access_token: (set via WXSYNC_ACCESS_TOKEN)");
                        }
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                // Check if config already exists
                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'wxsync config show' to view current configuration.");
                    return Ok(());
                }

                // Create parent directory
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to set list_url and client_id.");
                Ok(())
            }
        }
    }
}

fn print_value<T>(name: &str, value: &ConfigValue<T>, show: impl Fn(&T) -> String) {
    println!("{}: {}", name, show(&value.value));
    println!("  source: {}", value.source);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_template_parses() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, DEFAULT_CONFIG).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.cooldown_secs.value, 5);
        assert_eq!(config.cooldown_secs.source, ConfigSource::File);
    }

    #[test]
    fn test_init_writes_template_once() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("wxsync").join("config.yaml");
        let config = Config::load(Some(config_path.clone())).unwrap();
        let cmd = ConfigCommand {
            command: ConfigSubcommand::Init,
        };

        cmd.run(&config, Some(config_path.clone())).unwrap();
        assert_eq!(fs::read_to_string(&config_path).unwrap(), DEFAULT_CONFIG);

        fs::write(&config_path, "feed_url: http://kept").unwrap();
        cmd.run(&config, Some(config_path.clone())).unwrap();
        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "feed_url: http://kept"
        );
    }
}
