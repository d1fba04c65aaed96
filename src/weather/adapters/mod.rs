//! src/weather/adapters/mod.rs

mod openweather;
mod weatherapi;

pub use openweather::OpenWeatherAdapter;
pub use weatherapi::WeatherApiAdapter;

use crate::domain::WeatherSnapshot;
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    /// The provider does not know the requested city.
    #[error("city not found")]
    NotFound,
    /// Network, decoding, timeout or any other provider failure.
    #[error(transparent)]
    Transient(#[from] anyhow::Error),
}

/// One external weather source.
#[async_trait]
pub trait WeatherAdapter: Send + Sync {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherSnapshot, AdapterError>;
}

fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, anyhow::Error> {
    use anyhow::Context;
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build http client for weather provider.")
}
