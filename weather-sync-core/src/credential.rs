//! Bearer credentials and the seam through which the list store client asks
//! for them.
//!
//! The identity provider owns the credential lifecycle; callers only borrow
//! a token for the duration of one request.

use async_trait::async_trait;

use crate::error::SyncError;

/// Short-lived bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

/// Anything that can hand out a bearer token on demand.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<AccessToken, SyncError>;
}

/// A token supplied up front, e.g. from the environment.
#[derive(Debug, Clone)]
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(AccessToken::new(token))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn get_token(&self) -> Result<AccessToken, SyncError> {
        if self.0.secret().is_empty() {
            return Err(SyncError::Auth("Empty access token".to_string()));
        }
        Ok(self.0.clone())
    }
}
