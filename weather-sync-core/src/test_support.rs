//! Helpers for tests that exercise the HTTP clients against an in-process
//! axum server.

use axum::Router;
use tokio::net::TcpListener;

/// Binds an ephemeral local port and returns the listener with its base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("http://{}", addr))
}

/// Serves `app` on `listener` in the background.
pub fn spawn(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

/// Binds and serves in one step when the router does not need its own URL.
pub async fn serve(app: Router) -> String {
    let (listener, base_url) = bind().await;
    spawn(listener, app);
    base_url
}
