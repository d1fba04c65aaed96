//! tests/api/service.rs

use crate::helpers::{RecordingCacheMetrics, RecordingLogger, ScriptedAdapter};
use async_trait::async_trait;
use claims::assert_ok_eq;
use std::sync::Arc;
use std::time::Duration;
use weather_notify::domain::WeatherSnapshot;
use weather_notify::weather::{
    CacheBackend, CacheConfig, InMemoryBackend, WeatherAdapter, WeatherCache, WeatherChain,
    WeatherError, WeatherService,
};

/// Backend whose every call fails.
struct BrokenBackend;

#[async_trait]
impl CacheBackend for BrokenBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, anyhow::Error> {
        anyhow::bail!("connection refused")
    }
    async fn set_ex(
        &self,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> Result<(), anyhow::Error> {
        anyhow::bail!("connection refused")
    }
    async fn delete(&self, _key: &str) -> Result<(), anyhow::Error> {
        anyhow::bail!("connection refused")
    }
    async fn exists(&self, _key: &str) -> Result<bool, anyhow::Error> {
        anyhow::bail!("connection refused")
    }
    async fn ping(&self) -> Result<(), anyhow::Error> {
        anyhow::bail!("connection refused")
    }
    async fn stats(
        &self,
    ) -> Result<std::collections::HashMap<String, serde_json::Value>, anyhow::Error> {
        anyhow::bail!("connection refused")
    }
}

fn service(backend: Arc<dyn CacheBackend>, adapter: Arc<ScriptedAdapter>) -> WeatherService {
    let adapter: Arc<dyn WeatherAdapter> = adapter;
    let chain = WeatherChain::from_providers(
        vec![("scripted".to_string(), adapter)],
        Arc::new(RecordingLogger::default()),
    )
    .unwrap();
    let cache = WeatherCache::new(
        backend,
        CacheConfig::default(),
        Arc::new(RecordingCacheMetrics::default()),
    );
    WeatherService::new(Arc::new(cache), Arc::new(chain))
}

fn rainy() -> WeatherSnapshot {
    WeatherSnapshot::new(9.0, 95.0, "Rain")
}

#[tokio::test]
async fn empty_city_is_rejected_before_any_lookup() {
    let adapter = ScriptedAdapter::answering(rainy());
    let service = service(Arc::new(BrokenBackend), adapter.clone());

    for city in ["", "   ", "\t"] {
        let error = service.get_weather(city).await.unwrap_err();
        assert!(matches!(error, WeatherError::InvalidCity));
    }
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn warm_cache_makes_zero_provider_calls() {
    let backend = Arc::new(InMemoryBackend::new());
    let adapter = ScriptedAdapter::answering(rainy());
    let service = service(backend, adapter.clone());
    service
        .cache()
        .set("Kyiv", &WeatherSnapshot::new(1.0, 2.0, "Cached"), Duration::ZERO)
        .await
        .unwrap();

    assert_ok_eq!(
        service.get_weather("kyiv").await,
        WeatherSnapshot::new(1.0, 2.0, "Cached")
    );
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn cold_lookup_populates_the_cache() {
    let backend = Arc::new(InMemoryBackend::new());
    let adapter = ScriptedAdapter::answering(rainy());
    let service = service(backend, adapter.clone());

    assert_ok_eq!(service.get_weather("Lviv").await, rainy());

    assert_ok_eq!(service.cache().get("lviv").await, rainy());
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test]
async fn broken_cache_falls_back_to_providers() {
    let adapter = ScriptedAdapter::answering(rainy());
    let service = service(Arc::new(BrokenBackend), adapter.clone());

    // Both the read and the write-back fail; the lookup still succeeds.
    assert_ok_eq!(service.get_weather("Lviv").await, rainy());
    assert_ok_eq!(service.get_weather("Lviv").await, rainy());
    assert_eq!(adapter.calls(), 2);
}

#[tokio::test]
async fn chain_errors_are_propagated_unchanged() {
    let service = service(
        Arc::new(InMemoryBackend::new()),
        ScriptedAdapter::not_found(),
    );

    let error = service.get_weather("Atlantis").await.unwrap_err();

    assert!(error.is_not_found());
    assert_eq!(
        error.to_string(),
        "all weather providers failed, last error from scripted: city not found"
    );
    assert!(service.cache().get("Atlantis").await.unwrap_err().is_miss());
}
