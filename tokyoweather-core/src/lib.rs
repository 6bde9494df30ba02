//! Core library for the `tokyoweather` CLI.
//!
//! This crate defines:
//! - Japan Standard Time rendering
//! - The OpenWeatherMap current-weather client and its error taxonomy
//! - Shared domain models (requests, reports)
//! - Optional on-disk defaults and credential lookup
//!
//! It is used by `tokyoweather-cli`, but can also be reused by other binaries or services.

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::Config;
pub use error::WeatherError;
pub use model::{Units, WeatherReport, WeatherRequest};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
