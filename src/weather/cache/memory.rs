//! src/weather/cache/memory.rs

use super::{CacheBackend, CacheStats};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local backend for single-instance deployments and tests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: DashMap<String, CachedEntry>,
    evictions: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn evict_if_expired(&self, key: &str) {
        if self.entries.remove_if(key, |_, entry| entry.is_expired()).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        // the map guard is released before removing
        if expired {
            self.evict_if_expired(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), anyhow::Error> {
        self.entries.insert(
            key.to_owned(),
            CachedEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, anyhow::Error> {
        Ok(self.get(key).await?.is_some())
    }

    async fn ping(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, anyhow::Error> {
        Ok(CacheStats::from([
            ("backend".to_string(), serde_json::json!("memory")),
            ("entries".to_string(), serde_json::json!(self.entries.len())),
            (
                "expired_evictions".to_string(),
                serde_json::json!(self.evictions.load(Ordering::Relaxed)),
            ),
        ]))
    }
}
