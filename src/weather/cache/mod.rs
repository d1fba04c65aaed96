//! src/weather/cache/mod.rs
//!
//! Cache-aside store for weather snapshots keyed by normalized city name.

mod memory;
mod redis;

pub use memory::InMemoryBackend;
pub use redis::RedisBackend;

use crate::domain::WeatherSnapshot;
use crate::metrics::CacheMetrics;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub type CacheStats = HashMap<String, serde_json::Value>;

/// Key-value store behind [`WeatherCache`]. Implementations must be safe for
/// concurrent use; the cache does not lock around them.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), anyhow::Error>;
    async fn delete(&self, key: &str) -> Result<(), anyhow::Error>;
    async fn exists(&self, key: &str) -> Result<bool, anyhow::Error>;
    async fn ping(&self) -> Result<(), anyhow::Error>;
    async fn stats(&self) -> Result<CacheStats, anyhow::Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("cache miss for city: {0}")]
    Miss(String),
    #[error("cache unavailable")]
    Unavailable(#[source] anyhow::Error),
    #[error("cached data corrupted")]
    Corrupted(#[source] serde_json::Error),
    #[error("failed to encode weather data for caching")]
    Encode(#[source] serde_json::Error),
}

impl CacheError {
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss(_))
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub namespace: String,
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "weather:".to_string(),
            default_ttl: Duration::from_secs(600),
        }
    }
}

pub struct WeatherCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
    metrics: Arc<dyn CacheMetrics>,
}

impl WeatherCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        config: CacheConfig,
        metrics: Arc<dyn CacheMetrics>,
    ) -> Self {
        Self {
            backend,
            config,
            metrics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// `namespace + lowercase(trim(city))`
    pub fn cache_key(&self, city: &str) -> String {
        format!("{}{}", self.config.namespace, city.trim().to_lowercase())
    }

    #[tracing::instrument(name = "Read weather from cache", skip(self))]
    pub async fn get(&self, city: &str) -> Result<WeatherSnapshot, CacheError> {
        if !self.is_enabled() {
            self.metrics.inc_misses();
            return Err(CacheError::Miss(city.to_owned()));
        }
        let key = self.cache_key(city);
        let raw = match self.backend.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.metrics.inc_misses();
                return Err(CacheError::Miss(city.to_owned()));
            }
            Err(e) => {
                self.metrics.inc_misses();
                return Err(CacheError::Unavailable(e));
            }
        };
        match serde_json::from_str::<WeatherSnapshot>(&raw) {
            Ok(snapshot) => {
                self.metrics.inc_hits();
                Ok(snapshot)
            }
            Err(e) => {
                self.metrics.inc_misses();
                Err(CacheError::Corrupted(e))
            }
        }
    }

    /// Stores `snapshot`; a zero `ttl` falls back to the configured default.
    #[tracing::instrument(name = "Write weather to cache", skip(self, snapshot))]
    pub async fn set(
        &self,
        city: &str,
        snapshot: &WeatherSnapshot,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.metrics.inc_sets();
        if !self.is_enabled() {
            return Ok(());
        }
        let ttl = if ttl.is_zero() {
            self.config.default_ttl
        } else {
            ttl
        };
        let raw = serde_json::to_string(snapshot).map_err(CacheError::Encode)?;
        self.backend
            .set_ex(&self.cache_key(city), raw, ttl)
            .await
            .map_err(CacheError::Unavailable)
    }

    #[tracing::instrument(name = "Delete weather from cache", skip(self))]
    pub async fn delete(&self, city: &str) -> Result<(), CacheError> {
        self.metrics.inc_deletes();
        if !self.is_enabled() {
            return Ok(());
        }
        self.backend
            .delete(&self.cache_key(city))
            .await
            .map_err(CacheError::Unavailable)
    }

    pub async fn exists(&self, city: &str) -> Result<bool, CacheError> {
        if !self.is_enabled() {
            return Ok(false);
        }
        self.backend
            .exists(&self.cache_key(city))
            .await
            .map_err(CacheError::Unavailable)
    }

    pub async fn health(&self) -> Result<(), CacheError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.backend.ping().await.map_err(CacheError::Unavailable)
    }

    pub async fn get_stats(&self) -> Result<CacheStats, CacheError> {
        if !self.is_enabled() {
            return Ok(HashMap::from([(
                "cache_enabled".to_string(),
                serde_json::Value::Bool(false),
            )]));
        }
        let mut stats = self.backend.stats().await.map_err(CacheError::Unavailable)?;
        stats.insert("cache_enabled".to_string(), serde_json::Value::Bool(true));
        Ok(stats)
    }
}
