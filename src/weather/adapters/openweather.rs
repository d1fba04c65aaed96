//! src/weather/adapters/openweather.rs

use super::{http_client, AdapterError, WeatherAdapter};
use crate::domain::WeatherSnapshot;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Adapter for the OpenWeatherMap current weather API.
pub struct OpenWeatherAdapter {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl OpenWeatherAdapter {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        if api_key.expose_secret().trim().is_empty() {
            anyhow::bail!("OpenWeather API key is not configured.");
        }
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url,
            api_key,
        })
    }
}

#[derive(serde::Deserialize)]
struct OpenWeatherResponse {
    weather: Vec<Condition>,
    main: Main,
}

#[derive(serde::Deserialize)]
struct Condition {
    description: String,
}

#[derive(serde::Deserialize)]
struct Main {
    temp: f64,
    humidity: f64,
}

#[derive(serde::Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

#[async_trait]
impl WeatherAdapter for OpenWeatherAdapter {
    #[tracing::instrument(name = "Fetch weather from OpenWeather", skip(self))]
    async fn fetch_weather(&self, city: &str) -> Result<WeatherSnapshot, AdapterError> {
        if city.trim().is_empty() {
            return Err(anyhow::anyhow!("empty city provided").into());
        }
        let url = format!("{}/weather", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.expose_secret().as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Failed to get weather from OpenWeather.")?;

        if response.status() == StatusCode::NOT_FOUND {
            let error = response.json::<ErrorResponse>().await.unwrap_or_default();
            if error.message == "city not found" {
                return Err(AdapterError::NotFound);
            }
            return Err(anyhow::anyhow!("OpenWeather returned 404: {}", error.message).into());
        }
        if !response.status().is_success() {
            return Err(
                anyhow::anyhow!("OpenWeather returned status {}", response.status()).into(),
            );
        }

        let body = response
            .json::<OpenWeatherResponse>()
            .await
            .context("Failed to decode OpenWeather response.")?;
        let condition = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no weather data found"))?;
        Ok(WeatherSnapshot::new(
            body.main.temp,
            body.main.humidity,
            condition.description,
        ))
    }
}
