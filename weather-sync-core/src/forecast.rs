//! Builds feed batches from the National Weather Service API.
//!
//! For each location the collector resolves the grid point
//! (`/points/{lat},{lon}`), follows the returned forecast URL and keeps the
//! first (current) forecast period. Locations that fail are logged and
//! skipped so one bad grid point does not empty the whole batch.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::feed::FeedSource;
use crate::models::{FeedRecord, TemperatureUnit};

pub const DEFAULT_WEATHER_API: &str = "https://api.weather.gov";

/// The weather service rejects requests without an identifying agent.
pub const DEFAULT_USER_AGENT: &str = "(weather-sync, weather-sync@example.com)";

/// A named coordinate pair. Coordinates stay strings so they are echoed back
/// exactly as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: String,
    pub lon: String,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat: lat.into(),
            lon: lon.into(),
        }
    }

    /// "lat, lon" as stored in the list.
    pub fn coordinates(&self) -> String {
        format!("{}, {}", self.lat, self.lon)
    }
}

/// The five cities synced when no locations are configured.
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("New York, NY", "40.7128", "-74.0060"),
        Location::new("Los Angeles, CA", "34.0522", "-118.2437"),
        Location::new("Chicago, IL", "41.8781", "-87.6298"),
        Location::new("Houston, TX", "29.7604", "-95.3698"),
        Location::new("Phoenix, AZ", "33.4484", "-112.0740"),
    ]
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    forecast: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    name: String,
    temperature: f64,
    temperature_unit: TemperatureUnit,
    short_forecast: String,
}

/// Collects the current forecast for a fixed set of locations.
#[derive(Debug, Clone)]
pub struct ForecastCollector {
    api_base: String,
    user_agent: String,
    locations: Vec<Location>,
    http: reqwest::Client,
}

impl ForecastCollector {
    pub fn new(
        api_base: impl Into<String>,
        user_agent: impl Into<String>,
        locations: Vec<Location>,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            locations,
            http: reqwest::Client::new(),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Fetches every location in order, skipping the ones that fail.
    pub async fn collect(&self) -> Vec<FeedRecord> {
        let mut records = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            match self.forecast_for(location).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::error!("Could not fetch weather for {}: {}", location.name, e);
                }
            }
        }
        tracing::info!(
            "Collected {} of {} forecast(s)",
            records.len(),
            self.locations.len()
        );
        records
    }

    /// Current forecast period for one location.
    pub async fn forecast_for(&self, location: &Location) -> Result<FeedRecord, SyncError> {
        let points_url = format!("{}/points/{},{}", self.api_base, location.lat, location.lon);
        let points: PointsResponse = self.get_json(&points_url).await?;

        let forecast: ForecastResponse = self.get_json(&points.properties.forecast).await?;
        let current = forecast
            .properties
            .periods
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::Decode("forecast has no periods".to_string()))?;

        Ok(FeedRecord {
            title: location.name.clone(),
            latitude_longitude: location.coordinates(),
            name: current.name,
            temperature: current.temperature,
            temperature_unit: current.temperature_unit,
            short_forecast: current.short_forecast,
            date_time: Utc::now().trunc_subsecs(0),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SyncError> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(SyncError::from_transport)?;

        if !response.status().is_success() {
            return Err(SyncError::from_response(response).await);
        }

        let body = response.text().await.map_err(SyncError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FeedSource for ForecastCollector {
    async fn fetch_latest(&self) -> Result<Vec<FeedRecord>, SyncError> {
        Ok(self.collect().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bind, spawn};
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};

    /// Fake weather service: Chicago works, Houston's grid point errors,
    /// Phoenix has an empty forecast.
    async fn weather_api() -> String {
        let (listener, base_url) = bind().await;
        let base = base_url.clone();
        let app = Router::new()
            .route(
                "/points/{coords}",
                get(move |Path(coords): Path<String>, headers: HeaderMap| {
                    let base = base.clone();
                    async move {
                        if headers.get("user-agent").is_none() {
                            return StatusCode::FORBIDDEN.into_response();
                        }
                        let office = match coords.as_str() {
                            "41.8781,-87.6298" => "LOT",
                            "33.4484,-112.0740" => "PSR",
                            _ => {
                                return (StatusCode::INTERNAL_SERVER_ERROR, "grid lookup failed")
                                    .into_response()
                            }
                        };
                        Json(serde_json::json!({
                            "properties": {
                                "forecast": format!("{}/gridpoints/{}/forecast", base, office)
                            }
                        }))
                        .into_response()
                    }
                }),
            )
            .route(
                "/gridpoints/{office}/forecast",
                get(|Path(office): Path<String>| async move {
                    if office == "PSR" {
                        return Json(serde_json::json!({ "properties": { "periods": [] } }));
                    }
                    Json(serde_json::json!({
                        "properties": {
                            "periods": [
                                {
                                    "name": "This Afternoon",
                                    "temperature": 58,
                                    "temperatureUnit": "F",
                                    "shortForecast": "Partly Sunny"
                                },
                                {
                                    "name": "Tonight",
                                    "temperature": 41,
                                    "temperatureUnit": "F",
                                    "shortForecast": "Mostly Cloudy"
                                }
                            ]
                        }
                    }))
                }),
            );
        spawn(listener, app);
        base_url
    }

    fn chicago() -> Location {
        Location::new("Chicago, IL", "41.8781", "-87.6298")
    }

    #[test]
    fn test_default_locations() {
        let locations = default_locations();
        assert_eq!(locations.len(), 5);
        assert_eq!(locations[0].coordinates(), "40.7128, -74.0060");
    }

    #[tokio::test]
    async fn test_forecast_for_takes_first_period() {
        let api = weather_api().await;
        let collector = ForecastCollector::new(api, DEFAULT_USER_AGENT, vec![]);

        let record = collector.forecast_for(&chicago()).await.unwrap();

        assert_eq!(record.title, "Chicago, IL");
        assert_eq!(record.latitude_longitude, "41.8781, -87.6298");
        assert_eq!(record.name, "This Afternoon");
        assert_eq!(record.temperature, 58.0);
        assert_eq!(record.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(record.short_forecast, "Partly Sunny");
        assert_eq!(record.date_time.timestamp_subsec_nanos(), 0);
    }

    #[tokio::test]
    async fn test_forecast_for_empty_periods_is_decode_error() {
        let api = weather_api().await;
        let collector = ForecastCollector::new(api, DEFAULT_USER_AGENT, vec![]);

        let err = collector
            .forecast_for(&Location::new("Phoenix, AZ", "33.4484", "-112.0740"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
    }

    #[tokio::test]
    async fn test_collect_skips_failed_locations() {
        let api = weather_api().await;
        let collector = ForecastCollector::new(
            api,
            DEFAULT_USER_AGENT,
            vec![
                Location::new("Houston, TX", "29.7604", "-95.3698"),
                chicago(),
                Location::new("Phoenix, AZ", "33.4484", "-112.0740"),
            ],
        );

        let records = collector.fetch_latest().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Chicago, IL");
    }
}
