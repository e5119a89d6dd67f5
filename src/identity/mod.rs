//! Sign-in against the Microsoft identity platform.
//!
//! Interactive sign-in uses the authorization-code flow with PKCE and a local
//! redirect listener. The resulting session is cached on disk; later calls
//! to [`IdentityClient::get_token`] reuse the access token while it is fresh
//! and silently redeem the refresh token once it is not.

mod callback;
mod pkce;
mod session;

pub use callback::{CallbackParams, CallbackServer};
pub use pkce::Pkce;
pub use session::{username_from_id_token, Session, SessionStore};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::io;
use std::time::Duration;
use tokio::sync::Mutex;
use weather_sync_core::{AccessToken, SyncError, TokenProvider};

/// Scope needed to read and write SharePoint lists through Graph.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/Sites.ReadWrite.All";

/// How long to wait for the browser to come back.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors that can occur during authentication
#[derive(Debug)]
pub enum IdentityError {
    /// I/O error
    IoError(io::Error),
    /// HTTP request error
    HttpError(String),
    /// Token endpoint or authorize redirect returned an error
    ServerError { error: String, message: String },
    /// Session cache error
    SessionError(String),
    /// Redirect carried a state we did not send
    StateMismatch,
    /// Timeout waiting for callback
    Timeout,
    /// Client ID not configured
    NotConfigured,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::IoError(e) => write!(f, "I/O error: {}", e),
            IdentityError::HttpError(e) => write!(f, "HTTP error: {}", e),
            IdentityError::ServerError { error, message } => {
                write!(f, "{}: {}", error, message)
            }
            IdentityError::SessionError(e) => write!(f, "Session error: {}", e),
            IdentityError::StateMismatch => {
                write!(f, "Sign-in response did not match the request")
            }
            IdentityError::Timeout => write!(f, "Timed out waiting for authentication"),
            IdentityError::NotConfigured => write!(
                f,
                "Sign-in not configured. Set client_id in config or WXSYNC_CLIENT_ID."
            ),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<io::Error> for IdentityError {
    fn from(e: io::Error) -> Self {
        IdentityError::IoError(e)
    }
}

/// Where and as whom to sign in
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// e.g. `https://login.microsoftonline.com/{tenant}`
    pub authority: String,
    pub client_id: Option<String>,
    pub scopes: Vec<String>,
}

impl AuthSettings {
    pub fn for_tenant(tenant_id: &str, client_id: Option<String>) -> Self {
        Self {
            authority: format!("https://login.microsoftonline.com/{}", tenant_id),
            client_id,
            scopes: vec![
                GRAPH_SCOPE.to_string(),
                "offline_access".to_string(),
                "openid".to_string(),
                "profile".to_string(),
            ],
        }
    }

    fn scope(&self) -> String {
        self.scopes.join(" ")
    }

    fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority.trim_end_matches('/'))
    }

    /// Authorize URL for an interactive sign-in.
    pub fn authorize_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        state: &str,
        pkce: &Pkce,
    ) -> String {
        format!(
            "{}/oauth2/v2.0/authorize?client_id={}&response_type=code&redirect_uri={}\
             &response_mode=query&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.authority.trim_end_matches('/'),
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scope()),
            urlencoding::encode(state),
            urlencoding::encode(&pkce.challenge),
        )
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

impl TokenResponse {
    /// Builds a session, carrying over what a refresh response may omit.
    fn into_session(self, previous: Option<&Session>, now: DateTime<Utc>) -> Session {
        let username = self
            .id_token
            .as_deref()
            .and_then(username_from_id_token)
            .or_else(|| previous.map(|s| s.username.clone()))
            .unwrap_or_else(|| "unknown".to_string());
        let refresh_token = self
            .refresh_token
            .or_else(|| previous.and_then(|s| s.refresh_token.clone()));

        Session {
            username,
            access_token: self.access_token,
            refresh_token,
            expires_at: now + ChronoDuration::seconds(self.expires_in),
        }
    }
}

/// Owns the credential lifecycle for one user.
pub struct IdentityClient {
    settings: AuthSettings,
    store: SessionStore,
    session: Mutex<Option<Session>>,
    http: reqwest::Client,
}

impl IdentityClient {
    pub fn new(settings: AuthSettings, store: SessionStore) -> Self {
        Self {
            settings,
            store,
            session: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    /// Loads the cached account. Returns true when one is signed in.
    pub async fn initialize(&self) -> Result<bool, IdentityError> {
        let cached = self.store.load()?;
        let ready = cached.is_some();
        if let Some(session) = &cached {
            tracing::debug!("Signed in as {}", session.username);
        }
        *self.session.lock().await = cached;
        Ok(ready)
    }

    /// Name of the active account, if any.
    pub async fn account(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.username.clone())
    }

    /// Interactive sign-in. `open` receives the URL the user must visit.
    pub async fn login(&self, open: impl FnOnce(&str)) -> Result<String, IdentityError> {
        let client_id = self
            .settings
            .client_id
            .clone()
            .ok_or(IdentityError::NotConfigured)?;

        let pkce = Pkce::generate();
        let state = uuid::Uuid::new_v4().to_string();
        let server = CallbackServer::start().await?;
        let redirect_uri = server.redirect_uri();

        open(&self.settings.authorize_url(&client_id, &redirect_uri, &state, &pkce));

        let params = server.wait(LOGIN_TIMEOUT).await?;
        let code = check_callback(params, &state)?;

        let session = self
            .redeem(
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", client_id.as_str()),
                    ("code", code.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("code_verifier", pkce.verifier.as_str()),
                    ("scope", self.settings.scope().as_str()),
                ],
                None,
            )
            .await?;

        self.store.save(&session)?;
        let username = session.username.clone();
        *self.session.lock().await = Some(session);
        tracing::info!("Signed in as {}", username);
        Ok(username)
    }

    /// Forgets the cached account. Returns whether one was signed in.
    pub async fn logout(&self) -> Result<bool, IdentityError> {
        *self.session.lock().await = None;
        self.store.clear()
    }

    async fn refresh(&self, session: &Session) -> Result<Session, IdentityError> {
        let client_id = self
            .settings
            .client_id
            .clone()
            .ok_or(IdentityError::NotConfigured)?;
        let refresh_token = session.refresh_token.clone().ok_or_else(|| {
            IdentityError::SessionError(
                "Session expired. Run 'wxsync auth login' to sign in again.".to_string(),
            )
        })?;

        tracing::debug!("Refreshing access token for {}", session.username);
        self.redeem(
            &[
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("scope", self.settings.scope().as_str()),
            ],
            Some(session),
        )
        .await
    }

    /// Posts a grant to the token endpoint.
    async fn redeem(
        &self,
        form: &[(&str, &str)],
        previous: Option<&Session>,
    ) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.settings.token_endpoint())
            .form(form)
            .send()
            .await
            .map_err(|e| IdentityError::HttpError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::HttpError(e.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(e) => IdentityError::ServerError {
                    error: e.error,
                    message: e.error_description.unwrap_or_default(),
                },
                Err(_) => IdentityError::HttpError(format!("{}: {}", status, body)),
            });
        }

        let tokens: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| IdentityError::HttpError(format!("Invalid token response: {}", e)))?;
        Ok(tokens.into_session(previous, Utc::now()))
    }
}

#[async_trait]
impl TokenProvider for IdentityClient {
    async fn get_token(&self) -> Result<AccessToken, SyncError> {
        let mut guard = self.session.lock().await;
        let session = guard
            .as_ref()
            .ok_or_else(|| SyncError::Auth("No active account".to_string()))?;

        if session.is_fresh(Utc::now()) {
            return Ok(AccessToken::new(session.access_token.clone()));
        }

        let refreshed = self
            .refresh(session)
            .await
            .map_err(|e| SyncError::Auth(e.to_string()))?;
        self.store
            .save(&refreshed)
            .map_err(|e| SyncError::Auth(e.to_string()))?;

        let token = AccessToken::new(refreshed.access_token.clone());
        *guard = Some(refreshed);
        Ok(token)
    }
}

/// Extracts the authorization code, rejecting errors and foreign states.
fn check_callback(params: CallbackParams, expected_state: &str) -> Result<String, IdentityError> {
    if let Some(error) = params.error {
        return Err(IdentityError::ServerError {
            error,
            message: params.error_description.unwrap_or_default(),
        });
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(IdentityError::StateMismatch);
    }
    params.code.ok_or_else(|| IdentityError::ServerError {
        error: "missing_code".to_string(),
        message: "Redirect did not include an authorization code".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Form, Json, Router};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn settings(authority: &str) -> AuthSettings {
        AuthSettings {
            authority: authority.to_string(),
            client_id: Some("client-123".to_string()),
            scopes: vec![GRAPH_SCOPE.to_string(), "offline_access".to_string()],
        }
    }

    fn expired_session() -> Session {
        Session {
            username: "ada@contoso.com".to_string(),
            access_token: "stale".to_string(),
            refresh_token: Some("rt-1".to_string()),
            expires_at: Utc::now() - ChronoDuration::minutes(5),
        }
    }

    #[test]
    fn test_authorize_url() {
        let settings = AuthSettings::for_tenant("contoso", Some("client-123".to_string()));
        let pkce = Pkce::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        let url = settings.authorize_url(
            "client-123",
            "http://localhost:5000/callback",
            "state-1",
            &pkce,
        );

        assert!(url.starts_with(
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize?client_id=client-123"
        ));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fcallback"));
        assert!(url.contains("code_challenge=E9Melhoe2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"));
        assert!(url.contains("offline_access"));
        assert!(url.contains("state=state-1"));
    }

    #[test]
    fn test_check_callback() {
        let ok = CallbackParams {
            code: Some("c".to_string()),
            state: Some("s".to_string()),
            ..Default::default()
        };
        assert_eq!(check_callback(ok.clone(), "s").unwrap(), "c");
        assert!(matches!(
            check_callback(ok, "other"),
            Err(IdentityError::StateMismatch)
        ));

        let denied = CallbackParams {
            error: Some("access_denied".to_string()),
            error_description: Some("User cancelled".to_string()),
            ..Default::default()
        };
        let err = check_callback(denied, "s").unwrap_err();
        assert_eq!(err.to_string(), "access_denied: User cancelled");
    }

    #[tokio::test]
    async fn test_initialize_without_session_is_not_ready() {
        let temp_dir = tempdir().unwrap();
        let client = IdentityClient::new(
            settings("http://127.0.0.1:1"),
            SessionStore::new(temp_dir.path().join("session.json")),
        );

        assert!(!client.initialize().await.unwrap());
        assert_eq!(client.account().await, None);
        assert!(matches!(
            client.get_token().await,
            Err(SyncError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        store
            .save(&Session {
                access_token: "fresh".to_string(),
                expires_at: Utc::now() + ChronoDuration::hours(1),
                ..expired_session()
            })
            .unwrap();

        // Unreachable authority: a refresh would fail.
        let client = IdentityClient::new(settings("http://127.0.0.1:1"), store);
        assert!(client.initialize().await.unwrap());
        assert_eq!(client.account().await.as_deref(), Some("ada@contoso.com"));
        assert_eq!(client.get_token().await.unwrap().secret(), "fresh");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_persisted() {
        let grants = Arc::new(std::sync::Mutex::new(Vec::<HashMap<String, String>>::new()));
        let seen = grants.clone();
        let app = Router::new().route(
            "/oauth2/v2.0/token",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(form);
                    Json(serde_json::json!({
                        "access_token": "renewed",
                        "expires_in": 3600,
                        "token_type": "Bearer"
                    }))
                }
            }),
        );
        let authority = serve(app).await;

        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        store.save(&expired_session()).unwrap();

        let client = IdentityClient::new(settings(&authority), store.clone());
        assert!(client.initialize().await.unwrap());

        let token = client.get_token().await.unwrap();
        assert_eq!(token.secret(), "renewed");

        let grants = grants.lock().unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0]["grant_type"], "refresh_token");
        assert_eq!(grants[0]["refresh_token"], "rt-1");
        assert_eq!(grants[0]["client_id"], "client-123");

        // Refresh token and account carried over, new token persisted.
        let persisted = store.load().unwrap().unwrap();
        assert_eq!(persisted.access_token, "renewed");
        assert_eq!(persisted.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(persisted.username, "ada@contoso.com");
        assert!(persisted.is_fresh(Utc::now()));
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_auth_error() {
        let app = Router::new().route(
            "/oauth2/v2.0/token",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "invalid_grant",
                        "error_description": "AADSTS70008: The refresh token has expired."
                    })),
                )
            }),
        );
        let authority = serve(app).await;

        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        store.save(&expired_session()).unwrap();

        let client = IdentityClient::new(settings(&authority), store);
        client.initialize().await.unwrap();

        match client.get_token().await {
            Err(SyncError::Auth(message)) => assert!(message.contains("invalid_grant")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        store.save(&expired_session()).unwrap();

        let client = IdentityClient::new(settings("http://127.0.0.1:1"), store.clone());
        client.initialize().await.unwrap();

        assert!(client.logout().await.unwrap());
        assert_eq!(client.account().await, None);
        assert_eq!(store.load().unwrap(), None);
        assert!(!client.logout().await.unwrap());
    }
}
