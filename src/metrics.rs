//! src/metrics.rs
//!
//! Prometheus counters for the cache, the provider chain and notification
//! delivery.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "weather_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "weather_cache_misses_total";
    pub const CACHE_SETS_TOTAL: &str = "weather_cache_sets_total";
    pub const CACHE_DELETES_TOTAL: &str = "weather_cache_deletes_total";

    pub const PROVIDER_REQUESTS_TOTAL: &str = "weather_provider_requests_total";

    pub const NOTIFICATIONS_TOTAL: &str = "notifications_total";
}

/// Installs the Prometheus recorder. Returns `false` if one is already installed.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("Prometheus metrics already initialized");
        return false;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Failed to store Prometheus handle (already set)");
                return false;
            }
            tracing::info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            tracing::error!(error.message = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Metrics in Prometheus text format, `None` before [`init_metrics`].
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

/// Counter sink for [`crate::weather::WeatherCache`].
pub trait CacheMetrics: Send + Sync {
    fn inc_hits(&self);
    fn inc_misses(&self);
    fn inc_sets(&self);
    fn inc_deletes(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheMetrics;

impl CacheMetrics for NoopCacheMetrics {
    fn inc_hits(&self) {}
    fn inc_misses(&self) {}
    fn inc_sets(&self) {}
    fn inc_deletes(&self) {}
}

/// Forwards cache counters to the global recorder.
#[derive(Debug, Clone)]
pub struct PrometheusCacheMetrics {
    backend: &'static str,
}

impl PrometheusCacheMetrics {
    pub fn new(backend: &'static str) -> Self {
        Self { backend }
    }
}

impl CacheMetrics for PrometheusCacheMetrics {
    fn inc_hits(&self) {
        counter!(names::CACHE_HITS_TOTAL, "backend" => self.backend).increment(1);
    }

    fn inc_misses(&self) {
        counter!(names::CACHE_MISSES_TOTAL, "backend" => self.backend).increment(1);
    }

    fn inc_sets(&self) {
        counter!(names::CACHE_SETS_TOTAL, "backend" => self.backend).increment(1);
    }

    fn inc_deletes(&self) {
        counter!(names::CACHE_DELETES_TOTAL, "backend" => self.backend).increment(1);
    }
}

pub fn record_provider_outcome(provider: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        names::PROVIDER_REQUESTS_TOTAL,
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_delivery(frequency: &str, outcome: &'static str) {
    counter!(
        names::NOTIFICATIONS_TOTAL,
        "frequency" => frequency.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
