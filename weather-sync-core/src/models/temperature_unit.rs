use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit of a forecast temperature, as reported by the weather service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "C")]
    Celsius,
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Fahrenheit => write!(f, "F"),
            TemperatureUnit::Celsius => write!(f, "C"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "F" => Ok(TemperatureUnit::Fahrenheit),
            "C" => Ok(TemperatureUnit::Celsius),
            _ => Err(format!(
                "Invalid temperature unit '{}'. Valid options: F, C",
                s
            )),
        }
    }
}
