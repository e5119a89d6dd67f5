use serde::{Deserialize, Serialize};

/// A row persisted in the remote list store.
///
/// Column values are optional: the store leaves out empty columns entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Assigned by the store
    pub id: String,
    pub location: Option<String>,
    pub forecast_period: Option<String>,
    pub temperature: Option<f64>,
    pub unit: Option<String>,
    pub forecast: Option<String>,
    pub date_time: Option<String>,
}

impl ListItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_forecast(
        mut self,
        period: impl Into<String>,
        temperature: f64,
        unit: impl Into<String>,
        forecast: impl Into<String>,
    ) -> Self {
        self.forecast_period = Some(period.into());
        self.temperature = Some(temperature);
        self.unit = Some(unit.into());
        self.forecast = Some(forecast.into());
        self
    }

    pub fn with_date_time(mut self, date_time: impl Into<String>) -> Self {
        self.date_time = Some(date_time.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_item_new_is_empty() {
        let item = ListItem::new("7");
        assert_eq!(item.id, "7");
        assert!(item.location.is_none());
        assert!(item.temperature.is_none());
    }

    #[test]
    fn test_list_item_builders() {
        let item = ListItem::new("1")
            .with_location("Houston, TX")
            .with_forecast("Tonight", 71.0, "F", "Patchy Fog")
            .with_date_time("2025-03-14T18:30:00Z");

        assert_eq!(item.location.as_deref(), Some("Houston, TX"));
        assert_eq!(item.forecast_period.as_deref(), Some("Tonight"));
        assert_eq!(item.temperature, Some(71.0));
        assert_eq!(item.unit.as_deref(), Some("F"));
        assert_eq!(item.forecast.as_deref(), Some("Patchy Fog"));
        assert_eq!(item.date_time.as_deref(), Some("2025-03-14T18:30:00Z"));
    }
}
