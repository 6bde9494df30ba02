use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Units, WeatherReport, WeatherRequest},
};

use super::WeatherProvider;

pub const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
}

impl Default for OpenWeatherProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenWeatherProvider {
    pub fn new() -> Self {
        Self::with_base_url(CURRENT_WEATHER_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch current conditions for `request.city`.
    ///
    /// Issues at most one GET; `request.timeout` bounds the whole exchange,
    /// body included.
    pub async fn fetch(&self, request: &WeatherRequest) -> Result<WeatherReport, WeatherError> {
        let api_key = request.api_key.trim();
        if api_key.is_empty() {
            return Err(WeatherError::EmptyCredential);
        }

        debug!(city = %request.city, units = %request.units, "requesting current weather");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", request.city.as_str()),
                ("appid", api_key),
                ("units", request.units.as_str()),
            ])
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, request.timeout))?;

        let status = res.status();
        if !status.is_success() {
            debug!(%status, "weather service rejected request");
            return Err(match status {
                StatusCode::UNAUTHORIZED => WeatherError::InvalidCredential,
                StatusCode::NOT_FOUND => WeatherError::CityNotFound(request.city.clone()),
                _ => {
                    let details = match res.text().await {
                        Ok(body) => truncate_body(&body),
                        Err(e) if e.is_timeout() => {
                            return Err(WeatherError::Timeout(request.timeout));
                        }
                        Err(e) => format!("failed to read response body ({})", e.without_url()),
                    };
                    WeatherError::HttpError { status, details }
                }
            });
        }

        let body = res
            .text()
            .await
            .map_err(|e| transport_error(e, request.timeout))?;

        parse_current(&body, request.units)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport, WeatherError> {
        self.fetch(request).await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// Turn a successful response body into a report.
pub fn parse_current(body: &str, units: Units) -> Result<WeatherReport, WeatherError> {
    let raw: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| WeatherError::MalformedResponse(format!("body is not valid JSON ({e})")))?;

    let parsed = OwCurrentResponse::deserialize(&raw)
        .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| WeatherError::MalformedResponse("weather list is empty".to_string()))?;

    Ok(WeatherReport {
        description,
        temperature: round_one_decimal(parsed.main.temp),
        humidity: parsed.main.humidity,
        wind_speed: round_one_decimal(parsed.wind.speed),
        units,
        raw: Some(raw),
    })
}

/// Round half away from zero.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> WeatherError {
    // The URL carries the API key in its query string.
    let err = err.without_url();

    if err.is_timeout() {
        WeatherError::Timeout(timeout)
    } else if err.is_connect() {
        debug!(error = %err, "could not connect to weather service");
        WeatherError::ConnectionFailed { source: err }
    } else {
        WeatherError::RequestFailed(err.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
