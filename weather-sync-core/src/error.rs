//! Error taxonomy shared by the list store client, the feed client and the
//! sync orchestrator.

/// Errors raised by remote calls.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// No usable credential could be obtained
    Auth(String),
    /// The remote endpoint answered with a non-success status
    Remote { status: u16, body: String },
    /// The response body was not what we expected
    Decode(String),
    /// The request never produced an HTTP response
    Http(String),
}

impl SyncError {
    /// HTTP status carried by a `Remote` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        SyncError::Http(e.to_string())
    }

    /// Turns a non-success response into a `Remote` error, keeping the body
    /// as plain-text detail.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        SyncError::Remote { status, body }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Auth(e) => write!(f, "Authentication error: {}", e),
            SyncError::Remote { status, body } => {
                write!(f, "Remote error ({}): {}", status, body)
            }
            SyncError::Decode(e) => write!(f, "Invalid response: {}", e),
            SyncError::Http(e) => write!(f, "HTTP error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}
