//! tests/api/cache.rs

use crate::helpers::{spawn_app, RecordingCacheMetrics};
use claims::{assert_err, assert_ok, assert_ok_eq};
use std::sync::Arc;
use std::time::Duration;
use weather_notify::domain::WeatherSnapshot;
use weather_notify::weather::{
    CacheBackend, CacheConfig, CacheError, InMemoryBackend, WeatherCache,
};

fn cache_with(
    enabled: bool,
    default_ttl: Duration,
) -> (WeatherCache, Arc<InMemoryBackend>, Arc<RecordingCacheMetrics>) {
    let backend = Arc::new(InMemoryBackend::new());
    let metrics = Arc::new(RecordingCacheMetrics::default());
    let cache = WeatherCache::new(
        backend.clone(),
        CacheConfig {
            enabled,
            namespace: "weather:".into(),
            default_ttl,
        },
        metrics.clone(),
    );
    (cache, backend, metrics)
}

fn cloudy() -> WeatherSnapshot {
    WeatherSnapshot::new(22.5, 65.0, "Cloudy")
}

#[tokio::test]
async fn lookups_ignore_case_and_surrounding_whitespace() {
    let (cache, _, _) = cache_with(true, Duration::from_secs(600));

    assert_ok!(cache.set("Kyiv", &cloudy(), Duration::ZERO).await);

    assert_ok_eq!(cache.get("kyiv ").await, cloudy());
    assert!(cache.exists(" KYIV").await.unwrap());
}

#[tokio::test]
async fn absent_city_is_a_miss() {
    let (cache, _, metrics) = cache_with(true, Duration::from_secs(600));

    let error = cache.get("Dnipro").await.unwrap_err();

    assert!(error.is_miss());
    assert_eq!(metrics.counts(), (0, 1, 0, 0));
}

#[tokio::test]
async fn every_operation_counts_exactly_once() {
    let (cache, _, metrics) = cache_with(true, Duration::from_secs(600));

    cache.get("Kyiv").await.unwrap_err();
    cache.set("Kyiv", &cloudy(), Duration::ZERO).await.unwrap();
    cache.get("Kyiv").await.unwrap();
    cache.get("KYIV").await.unwrap();
    cache.delete("Kyiv").await.unwrap();
    cache.get("Kyiv").await.unwrap_err();

    // (hits, misses, sets, deletes)
    assert_eq!(metrics.counts(), (2, 2, 1, 1));
}

#[tokio::test]
async fn disabled_cache_misses_and_ignores_writes() {
    let (cache, backend, metrics) = cache_with(false, Duration::from_secs(600));

    assert_ok!(cache.set("Kyiv", &cloudy(), Duration::ZERO).await);
    let error = cache.get("Kyiv").await.unwrap_err();
    assert_ok!(cache.delete("Kyiv").await);

    assert!(error.is_miss());
    assert!(!cache.exists("Kyiv").await.unwrap());
    assert_ok!(cache.health().await);
    assert_eq!(
        cache.get_stats().await.unwrap(),
        std::collections::HashMap::from([("cache_enabled".to_string(), serde_json::json!(false))])
    );
    // Nothing reached the backend.
    assert!(backend.get("weather:kyiv").await.unwrap().is_none());
    assert_eq!(metrics.counts(), (0, 1, 1, 1));
}

#[tokio::test]
async fn entries_expire_after_their_ttl() {
    let (cache, _, _) = cache_with(true, Duration::from_secs(600));

    cache
        .set("Kharkiv", &cloudy(), Duration::from_millis(50))
        .await
        .unwrap();
    assert_ok!(cache.get("Kharkiv").await);

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(cache.get("Kharkiv").await.unwrap_err().is_miss());
}

#[tokio::test]
async fn zero_ttl_uses_the_configured_default() {
    let (cache, _, _) = cache_with(true, Duration::from_millis(50));

    cache.set("Kharkiv", &cloudy(), Duration::ZERO).await.unwrap();
    assert_ok!(cache.get("Kharkiv").await);

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_err!(cache.get("Kharkiv").await);
}

#[tokio::test]
async fn corrupted_entry_is_reported_and_counted_as_miss() {
    let (cache, backend, metrics) = cache_with(true, Duration::from_secs(600));
    backend
        .set_ex("weather:poltava", "not json".into(), Duration::from_secs(60))
        .await
        .unwrap();

    let error = cache.get("Poltava").await.unwrap_err();

    assert!(matches!(error, CacheError::Corrupted(_)));
    assert_eq!(metrics.counts(), (0, 1, 0, 0));
}

#[tokio::test]
async fn stats_report_backend_counters() {
    let (cache, _, _) = cache_with(true, Duration::from_secs(600));
    cache.set("Kyiv", &cloudy(), Duration::ZERO).await.unwrap();

    let stats = cache.get_stats().await.unwrap();

    assert_eq!(stats["cache_enabled"], serde_json::json!(true));
    assert_eq!(stats["backend"], serde_json::json!("memory"));
    assert_eq!(stats["entries"], serde_json::json!(1));
}

#[tokio::test]
async fn cache_endpoints_report_health_and_stats() {
    let app = spawn_app().await;

    let health = app.get_path("/cache/health").await;
    let stats = app.get_path("/cache/stats").await;

    assert_eq!(health.status().as_u16(), 200);
    assert_eq!(stats.status().as_u16(), 200);
    let stats: serde_json::Value = stats.json().await.unwrap();
    assert_eq!(stats["cache_enabled"], serde_json::json!(true));
}
