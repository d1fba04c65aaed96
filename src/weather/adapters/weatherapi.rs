//! src/weather/adapters/weatherapi.rs

use super::{http_client, AdapterError, WeatherAdapter};
use crate::domain::WeatherSnapshot;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Error code WeatherAPI.com uses for "No matching location found."
const LOCATION_NOT_FOUND: i64 = 1006;

/// Adapter for the WeatherAPI.com current weather endpoint.
pub struct WeatherApiAdapter {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl WeatherApiAdapter {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        if api_key.expose_secret().trim().is_empty() {
            anyhow::bail!("WeatherAPI key is not configured.");
        }
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url,
            api_key,
        })
    }
}

// WeatherAPI answers with either `current` or `error`, often with a 4xx
// status, so the body is decoded regardless of the status code.
#[derive(serde::Deserialize)]
struct WeatherApiResponse {
    #[serde(default)]
    current: Option<Current>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(serde::Deserialize)]
struct Current {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

#[derive(serde::Deserialize)]
struct Condition {
    text: String,
}

#[derive(serde::Deserialize)]
struct ApiError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl WeatherAdapter for WeatherApiAdapter {
    #[tracing::instrument(name = "Fetch weather from WeatherAPI", skip(self))]
    async fn fetch_weather(&self, city: &str) -> Result<WeatherSnapshot, AdapterError> {
        if city.trim().is_empty() {
            return Err(anyhow::anyhow!("empty city provided").into());
        }
        let url = format!("{}/current.json", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("key", self.api_key.expose_secret().as_str()), ("q", city)])
            .send()
            .await
            .context("Failed to get weather from WeatherAPI.")?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("Failed to read WeatherAPI response body.")?;
        if body.is_empty() {
            return Err(anyhow::anyhow!("empty response body from WeatherAPI").into());
        }
        let body: WeatherApiResponse =
            serde_json::from_slice(&body).context("Failed to decode WeatherAPI response.")?;

        if let Some(error) = body.error {
            if error.code == LOCATION_NOT_FOUND {
                return Err(AdapterError::NotFound);
            }
            return Err(anyhow::anyhow!("WeatherAPI error: {}", error.message).into());
        }
        match body.current {
            Some(current) => Ok(WeatherSnapshot::new(
                current.temp_c,
                current.humidity,
                current.condition.text,
            )),
            None => Err(anyhow::anyhow!(
                "WeatherAPI returned status {} without weather data",
                status
            )
            .into()),
        }
    }
}
