//! src/weather/mod.rs
//!
//! Weather resolution: provider adapters chained in a fixed fallback order,
//! fronted by a TTL cache.

pub mod adapters;
pub mod cache;
pub mod chain;
pub mod service;

pub use adapters::{AdapterError, OpenWeatherAdapter, WeatherAdapter, WeatherApiAdapter};
pub use cache::{
    CacheBackend, CacheConfig, CacheError, InMemoryBackend, RedisBackend, WeatherCache,
};
pub use chain::{
    ProviderLink, ProviderLogger, ProviderOutcome, TracingProviderLogger, WeatherChain,
};
pub use service::WeatherService;

use crate::domain::WeatherSnapshot;
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum WeatherError {
    #[error("invalid city")]
    InvalidCity,
    #[error("all weather providers failed, last error from {provider}: {source}")]
    ProvidersExhausted {
        provider: String,
        #[source]
        source: AdapterError,
    },
}

impl WeatherError {
    /// True if the last provider that was asked reported an unknown city.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WeatherError::ProvidersExhausted {
                source: AdapterError::NotFound,
                ..
            }
        )
    }
}

/// Anything that can answer "what is the weather in `city`".
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get_weather(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;
}
