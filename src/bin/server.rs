//! Weather feed server
//!
//! Serves the latest National Weather Service forecast for a fixed set of
//! locations in the batch format the `wxsync` client consumes.
//!
//! # Configuration
//!
//! Environment variables:
//! - `WXSYNC_FEED_PORT`: Port to listen on (default: 8080)
//! - `WXSYNC_WEATHER_API`: Weather service base URL (default: https://api.weather.gov)
//! - `WXSYNC_USER_AGENT`: User-Agent sent to the weather service
//! - `WXSYNC_FEED_CONFIG`: Path to config file (default: ~/.config/wxsync-feed/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! locations:
//!   - name: "Chicago, IL"
//!     lat: "41.8781"
//!     lon: "-87.6298"
//! ```
//!
//! Without a config file the five default cities are served.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET /api/syncWeather`: Current forecast for every location

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_sync_core::forecast::{DEFAULT_USER_AGENT, DEFAULT_WEATHER_API};
use weather_sync_core::{default_locations, FeedRecord, ForecastCollector, Location, FEED_PATH};

// ============================================================================
// Configuration
// ============================================================================

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    locations: Vec<Location>,
}

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Weather service base URL
    weather_api: String,
    user_agent: String,
    /// Path to config file
    config_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("WXSYNC_FEED_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let weather_api = std::env::var("WXSYNC_WEATHER_API")
            .unwrap_or_else(|_| DEFAULT_WEATHER_API.to_string());

        let user_agent =
            std::env::var("WXSYNC_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let config_path = std::env::var("WXSYNC_FEED_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("wxsync-feed")
                    .join("config.yaml")
            });

        Self {
            port,
            weather_api,
            user_agent,
            config_path,
        }
    }
}

/// Load locations from the config file, falling back to the default cities.
fn load_locations(config_path: &Path) -> Vec<Location> {
    let locations = match std::fs::read_to_string(config_path) {
        Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
            Ok(config) => config.locations,
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            );
            Vec::new()
        }
    };

    if locations.is_empty() {
        tracing::info!("Serving default locations");
        default_locations()
    } else {
        tracing::info!("Loaded {} location(s)", locations.len());
        locations
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    collector: Arc<ForecastCollector>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Latest forecast batch. Locations the weather service fails on are left out.
async fn sync_weather(State(state): State<AppState>) -> Json<Vec<FeedRecord>> {
    Json(state.collector.collect().await)
}

fn app(collector: ForecastCollector) -> Router {
    let state = AppState {
        collector: Arc::new(collector),
    };

    Router::new()
        .route("/health", get(health))
        .route(FEED_PATH, get(sync_weather))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wxsync_feed=info,weather_sync_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Weather API: {}", config.weather_api);
    tracing::info!("Config file: {}", config.config_path.display());

    let locations = load_locations(&config.config_path);
    let collector = ForecastCollector::new(config.weather_api, config.user_agent, locations);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app(collector)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn unreachable_collector(locations: Vec<Location>) -> ForecastCollector {
        ForecastCollector::new("http://127.0.0.1:1", DEFAULT_USER_AGENT, locations)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(unreachable_collector(Vec::new()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_sync_weather_skips_failed_locations() {
        let collector = unreachable_collector(vec![Location::new("Chicago, IL", "41.8781", "-87.6298")]);

        let response = app(collector)
            .oneshot(Request::get(FEED_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"[]");
    }

    #[test]
    fn test_load_locations_from_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "locations:\n  - name: \"Seattle, WA\"\n    lat: \"47.6062\"\n    lon: \"-122.3321\"\n",
        )
        .unwrap();

        let locations = load_locations(&path);

        assert_eq!(
            locations,
            vec![Location::new("Seattle, WA", "47.6062", "-122.3321")]
        );
    }

    #[test]
    fn test_missing_config_serves_default_locations() {
        let temp_dir = tempdir().unwrap();
        let locations = load_locations(&temp_dir.path().join("missing.yaml"));
        assert_eq!(locations, default_locations());
    }
}
