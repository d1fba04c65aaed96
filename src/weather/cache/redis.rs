//! src/weather/cache/redis.rs

use super::{CacheBackend, CacheStats};
use anyhow::Context;
use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime, Timeouts};
use std::time::Duration;

/// Networked backend over a pooled Redis connection.
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Builds the pool. No connection is opened until the first command.
    pub fn new(url: &str, pool_size: usize, timeout: Duration) -> Result<Self, anyhow::Error> {
        let mut config = Config::from_url(url);
        let mut pool_config = PoolConfig::new(pool_size);
        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(timeout);
        timeouts.create = Some(timeout);
        timeouts.recycle = Some(timeout);
        pool_config.timeouts = timeouts;
        config.pool = Some(pool_config);

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .context("Failed to create Redis connection pool.")?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, anyhow::Error> {
        self.pool
            .get()
            .await
            .context("Failed to get a Redis connection from the pool.")
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.context("Redis GET failed.")?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), anyhow::Error> {
        let mut conn = self.connection().await?;
        // Redis expiry has second resolution
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .context("Redis SET EX failed.")?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key).await.context("Redis DEL failed.")?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.connection().await?;
        let found: bool = conn.exists(key).await.context("Redis EXISTS failed.")?;
        Ok(found)
    }

    async fn ping(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.connection().await?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed.")?;
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, anyhow::Error> {
        let mut conn = self.connection().await?;
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .arg("stats")
            .query_async(&mut conn)
            .await
            .context("Failed to get Redis stats.")?;
        let status = self.pool.status();
        Ok(CacheStats::from([
            ("backend".to_string(), serde_json::json!("redis")),
            ("redis_info".to_string(), serde_json::json!(info)),
            ("pool_max_size".to_string(), serde_json::json!(status.max_size)),
            ("pool_size".to_string(), serde_json::json!(status.size)),
            ("pool_available".to_string(), serde_json::json!(status.available)),
            ("pool_waiting".to_string(), serde_json::json!(status.waiting)),
        ]))
    }
}
