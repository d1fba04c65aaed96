//! src/weather/service.rs

use crate::domain::WeatherSnapshot;
use crate::weather::{WeatherCache, WeatherChain, WeatherError, WeatherProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Cache-first weather lookup falling back to the provider chain.
#[derive(Clone)]
pub struct WeatherService {
    cache: Arc<WeatherCache>,
    chain: Arc<WeatherChain>,
}

impl WeatherService {
    pub fn new(cache: Arc<WeatherCache>, chain: Arc<WeatherChain>) -> Self {
        Self { cache, chain }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    #[tracing::instrument(name = "Get weather for city", skip(self))]
    pub async fn get_weather(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidCity);
        }

        match self.cache.get(city).await {
            Ok(snapshot) => {
                tracing::debug!("Serving weather from cache");
                return Ok(snapshot);
            }
            Err(e) if e.is_miss() => {}
            Err(e) => tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                "Cache read failed, asking weather providers"
            ),
        }

        let snapshot = self.chain.get_weather(city).await?;

        // A zero ttl picks the cache's default expiration.
        if let Err(e) = self.cache.set(city, &snapshot, Duration::ZERO).await {
            tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to cache weather"
            );
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherProvider for WeatherService {
    async fn get_weather(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        WeatherService::get_weather(self, city).await
    }
}
