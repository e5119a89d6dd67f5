//! Authentication commands for the wxsync CLI.
//!
//! Provides login, logout, and status commands against the Microsoft
//! identity platform.

use clap::{Args, Subcommand};

use super::identity_client;
use crate::config::Config;
use crate::identity::IdentityError;

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Sign in through the browser
    Login,
    /// Sign out (remove the cached session)
    Logout,
    /// Show authentication status
    Status,
}

impl AuthCommand {
    pub async fn run(&self, config: &Config) -> Result<(), IdentityError> {
        match &self.command {
            AuthSubcommand::Login => login(config).await,
            AuthSubcommand::Logout => logout(config).await,
            AuthSubcommand::Status => status(config).await,
        }
    }
}

/// Interactive login flow
async fn login(config: &Config) -> Result<(), IdentityError> {
    let identity = identity_client(config);

    let username = identity
        .login(|url| {
            println!("Open this URL in your browser to sign in:");
            println!();
            println!("  {}", url);
            println!();
            println!("Waiting for you to complete sign-in (timeout: 5 minutes)");
        })
        .await?;

    println!("Signed in as: {}", username);
    Ok(())
}

async fn logout(config: &Config) -> Result<(), IdentityError> {
    let identity = identity_client(config);
    if identity.logout().await? {
        println!("Logged out.");
    } else {
        println!("Already logged out (no cached session).");
    }
    Ok(())
}

/// Show authentication status
async fn status(config: &Config) -> Result<(), IdentityError> {
    if config.access_token.is_some() {
        println!("Using access token from WXSYNC_ACCESS_TOKEN.");
        return Ok(());
    }

    let identity = identity_client(config);
    if identity.initialize().await? {
        let account = identity.account().await.unwrap_or_default();
        println!("Signed in as: {}", account);
    } else if config.require_client_id().is_ok() {
        println!("Not signed in. Run 'wxsync auth login' to authenticate.");
    } else {
        println!("Not configured. Set client_id in config first.");
    }
    Ok(())
}
