//! Redis cache backend implementation.
//!
//! Lets several API processes share one cache, so an invalidation issued by
//! one process is seen by all of them.

use super::CacheBackend;
use crate::error::{Error, Result};
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Connection, Pool, Runtime};

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
const DEFAULT_POOL_SIZE: u32 = 16;

/// Configuration for Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// `redis://[user:password@]host:port/db`
    pub url: String,
    pub pool_size: u32,
    /// Prepended to every key, e.g. `shop:` turns `categories` into `shop:categories`.
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            url: "redis://localhost:6379/0".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            namespace: "shop:".to_string(),
        }
    }
}

impl RedisConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        RedisConfig {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Build the stored key for a logical cache key.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

/// Redis backend with connection pooling and async operations.
///
/// Uses deadpool for async connection pooling.
///
/// # Example
///
/// ```no_run
/// # use shop_kit::backend::{RedisBackend, RedisConfig, CacheBackend};
/// # async fn example() -> shop_kit::Result<()> {
/// let backend = RedisBackend::new(RedisConfig::default())?;
///
/// backend.set("categories", b"value".to_vec()).await?;
/// let value = backend.get("categories").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
    config: RedisConfig,
}

impl RedisBackend {
    /// Create new Redis backend from configuration.
    ///
    /// The pool connects lazily; use [`CacheBackend::health_check`] to verify
    /// the server is reachable.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(config.url.clone());
        cfg.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size as usize));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis backend initialized (pool size: {}, namespace: {})",
            config.pool_size, config.namespace
        );

        Ok(RedisBackend { pool, config })
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(self.config.namespaced(key))
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.set::<_, _, ()>(self.config.namespaced(key), value)
            .await
            .map_err(|e| Error::BackendError(format!("Redis SET failed for key {}: {}", key, e)))?;

        debug!("✓ Redis SET {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(self.config.namespaced(key))
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(self.config.namespaced(key)).await.map_err(|e| {
            Error::BackendError(format!("Redis EXISTS failed for key {}: {}", key, e))
        })?;

        Ok(exists)
    }

    async fn mdelete(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        let namespaced: Vec<String> = keys.iter().map(|k| self.config.namespaced(k)).collect();

        conn.del::<_, ()>(namespaced)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL (bulk) failed: {}", e)))?;

        debug!("✓ Redis MDELETE {} keys", keys.len());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong.contains("PONG"))
    }

    async fn clear_all(&self) -> Result<()> {
        let mut conn = self.connection().await?;

        deadpool_redis::redis::cmd("FLUSHDB")
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis FLUSHDB failed: {}", e)))?;

        warn!("⚠ Redis FLUSHDB executed - all cache cleared!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_default() {
        let config = RedisConfig::default();
        assert_eq!(config.url, "redis://localhost:6379/0");
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.namespaced("categories"), "shop:categories");
    }

    #[test]
    fn test_redis_config_from_url() {
        let config = RedisConfig::from_url("redis://cache:6380/2");
        assert_eq!(config.url, "redis://cache:6380/2");
        assert_eq!(config.namespace, "shop:");
    }

    // Integration tests - require running Redis server
    // Run with: cargo test --features redis -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_redis_backend_set_get_delete() {
        let backend =
            RedisBackend::new(RedisConfig::default()).expect("Failed to create backend");

        backend
            .set("product-test", b"value".to_vec())
            .await
            .expect("Failed to set");
        assert_eq!(
            backend.get("product-test").await.expect("Failed to get"),
            Some(b"value".to_vec())
        );

        backend
            .mdelete(&["product-test", "categories"])
            .await
            .expect("Failed to mdelete");
        assert!(!backend.exists("product-test").await.expect("Failed to check"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_backend_health_check() {
        let backend =
            RedisBackend::new(RedisConfig::default()).expect("Failed to create backend");

        assert!(backend.health_check().await.expect("Failed to check health"));
    }
}
