//! Short-lived local HTTP server that captures the authorization redirect.

use axum::{extract::Query, response::Html, routing::get, Router};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::IdentityError;

/// Query parameters of the redirect back from the authorize endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Weather Sync - Signed in</title></head>
<body>
<h1>Authentication complete</h1>
<p>You can close this window and return to the terminal.</p>
</body>
</html>"#;

/// Callback server listening on an ephemeral port on 127.0.0.1.
pub struct CallbackServer {
    port: u16,
    receiver: oneshot::Receiver<CallbackParams>,
    handle: JoinHandle<()>,
}

impl CallbackServer {
    pub async fn start() -> Result<Self, IdentityError> {
        let (tx, rx) = oneshot::channel::<CallbackParams>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        let app = Router::new().route(
            "/callback",
            get(move |Query(params): Query<CallbackParams>| {
                let tx = tx.clone();
                async move {
                    // Only the first redirect counts
                    let sender = tx.lock().ok().and_then(|mut slot| slot.take());
                    if let Some(sender) = sender {
                        let _ = sender.send(params);
                    }
                    Html(SUCCESS_PAGE)
                }
            }),
        );

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!("Auth callback server stopped: {}", e);
            }
        });

        Ok(Self {
            port,
            receiver: rx,
            handle,
        })
    }

    /// Redirect URI to register with the authorize request.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.port())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the redirect, then shuts the server down.
    pub async fn wait(self, timeout: Duration) -> Result<CallbackParams, IdentityError> {
        let result = tokio::time::timeout(timeout, self.receiver).await;
        self.handle.abort();

        match result {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) | Err(_) => Err(IdentityError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_callback_captures_query() {
        let server = CallbackServer::start().await.unwrap();
        let url = format!(
            "http://127.0.0.1:{}/callback?code=abc&state=xyz",
            server.port()
        );

        let page = reqwest::get(&url).await.unwrap().text().await.unwrap();
        assert!(page.contains("Authentication complete"));

        let params = server.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());
    }

    #[tokio::test]
    async fn test_callback_times_out() {
        let server = CallbackServer::start().await.unwrap();
        assert!(server.redirect_uri().ends_with("/callback"));

        let err = server.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, IdentityError::Timeout));
    }
}
