use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::temperature_unit::TemperatureUnit;

/// One forecast observation produced by the feed endpoint.
///
/// Field names on the wire match the list store's column names, so the
/// serialized form doubles as the body of an append request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeedRecord {
    /// Location name, e.g. "Chicago, IL"
    pub title: String,
    /// "lat, lon" as a display string
    pub latitude_longitude: String,
    /// Forecast period name, e.g. "This Afternoon"
    pub name: String,
    pub temperature: f64,
    pub temperature_unit: TemperatureUnit,
    pub short_forecast: String,
    #[serde(with = "wire_time")]
    pub date_time: DateTime<Utc>,
}

impl FeedRecord {
    /// Label used in status and log lines for this record.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }
}

impl fmt::Display for FeedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}°{} {}",
            self.title, self.name, self.temperature, self.temperature_unit, self.short_forecast
        )
    }
}

/// Timestamps travel as `YYYY-MM-DDTHH:MM:SSZ`.
pub(crate) mod wire_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
