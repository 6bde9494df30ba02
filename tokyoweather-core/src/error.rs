use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Every way a weather fetch can fail.
///
/// A fetch either yields a complete [`WeatherReport`](crate::WeatherReport) or
/// exactly one of these; raw transport errors never leak to the caller.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("API key cannot be empty")]
    EmptyCredential,

    #[error("Request timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Failed to connect to weather service")]
    ConnectionFailed {
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid API key")]
    InvalidCredential,

    #[error("City '{0}' not found")]
    CityNotFound(String),

    #[error("HTTP error: {status}: {details}")]
    HttpError { status: StatusCode, details: String },

    #[error("Unexpected API response format: {0}")]
    MalformedResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl WeatherError {
    /// HTTP status the provider answered with, when the failure came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            WeatherError::InvalidCredential => Some(StatusCode::UNAUTHORIZED),
            WeatherError::CityNotFound(_) => Some(StatusCode::NOT_FOUND),
            WeatherError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
