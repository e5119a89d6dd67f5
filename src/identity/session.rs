//! Signed-in session cached on disk between invocations.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::IdentityError;

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The active account and its tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// True while the access token has more than the margin left.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now > Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct IdClaims {
    preferred_username: Option<String>,
    upn: Option<String>,
    name: Option<String>,
}

/// Account name from an unverified ID token. The token came straight from
/// the token endpoint over TLS, so only the claims are read.
pub fn username_from_id_token(id_token: &str) -> Option<String> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: IdClaims = serde_json::from_slice(&bytes).ok()?;
    claims.preferred_username.or(claims.upn).or(claims.name)
}

/// JSON file holding the session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the cached session, if any.
    pub fn load(&self) -> Result<Option<Session>, IdentityError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&contents).map_err(|e| {
            IdentityError::SessionError(format!(
                "Corrupt session file '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| IdentityError::SessionError(e.to_string()))?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Removes the cached session. Returns whether there was one.
    pub fn clear(&self) -> Result<bool, IdentityError> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            username: "ada@contoso.com".to_string(),
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            expires_at,
        }
    }

    #[test]
    fn test_is_fresh_respects_margin() {
        let now = Utc::now();
        assert!(session(now + Duration::minutes(30)).is_fresh(now));
        assert!(!session(now + Duration::seconds(30)).is_fresh(now));
        assert!(!session(now - Duration::minutes(1)).is_fresh(now));
    }

    #[test]
    fn test_store_roundtrip_and_clear() {
        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.clear().unwrap());

        let saved = session(Utc::now());
        store.save(&saved).unwrap();
        assert_eq!(store.load().unwrap(), Some(saved));

        assert!(store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_session_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = SessionStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Corrupt session file"));
    }

    #[test]
    fn test_username_from_id_token() {
        let claims = URL_SAFE_NO_PAD.encode(r#"{"preferred_username":"ada@contoso.com","name":"Ada"}"#);
        let token = format!("eyJhbGciOiJub25lIn0.{}.sig", claims);
        assert_eq!(
            username_from_id_token(&token),
            Some("ada@contoso.com".to_string())
        );
    }

    #[test]
    fn test_username_from_id_token_falls_back_to_name() {
        let claims = URL_SAFE_NO_PAD.encode(r#"{"name":"Ada Lovelace"}"#);
        let token = format!("h.{}.s", claims);
        assert_eq!(username_from_id_token(&token), Some("Ada Lovelace".to_string()));
    }

    #[test]
    fn test_username_from_garbage_token() {
        assert_eq!(username_from_id_token("not-a-jwt"), None);
        assert_eq!(username_from_id_token("a.!!!.c"), None);
    }
}
