use std::{fmt, str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CITY: &str = "Tokyo";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Unit system the provider reports temperature and wind speed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Standard]
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    pub fn speed_suffix(&self) -> &'static str {
        match self {
            Units::Metric | Units::Standard => "m/s",
            Units::Imperial => "mph",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown unit system '{0}'. Supported: metric, imperial, standard.")]
pub struct ParseUnitsError(String);

impl FromStr for Units {
    type Err = ParseUnitsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(ParseUnitsError(value.to_owned())),
        }
    }
}

/// Parameters of a single current-weather lookup.
#[derive(Clone)]
pub struct WeatherRequest {
    pub city: String,
    pub units: Units,
    pub timeout: Duration,
    pub api_key: String,
}

impl WeatherRequest {
    /// Request for the default city in metric units with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            city: DEFAULT_CITY.to_owned(),
            units: Units::default(),
            timeout: DEFAULT_TIMEOUT,
            api_key: api_key.into(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// The key must never end up in logs.
impl fmt::Debug for WeatherRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherRequest")
            .field("city", &self.city)
            .field("units", &self.units)
            .field("timeout", &self.timeout)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Current conditions for one city, as parsed from a provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub description: String,
    /// Rounded to one decimal place.
    pub temperature: f64,
    pub humidity: u8,
    /// Rounded to one decimal place.
    pub wind_speed: f64,
    pub units: Units,
    /// Verbatim provider payload, kept for diagnostics.
    pub raw: Option<serde_json::Value>,
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weather: {}", self.description)?;
        writeln!(
            f,
            "Temperature: {} {}",
            self.temperature,
            self.units.temperature_suffix()
        )?;
        writeln!(f, "Humidity: {} %", self.humidity)?;
        write!(f, "Wind: {} {}", self.wind_speed, self.units.speed_suffix())
    }
}
