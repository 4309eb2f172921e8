//! Cache backend implementations.

use crate::error::Result;
use std::future::Future;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for cache backend implementations.
///
/// Abstracts key/value storage so the process-local map can be swapped for an
/// external cache service. Entries never expire on their own; they live until
/// an invalidation deletes them.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// **ASYNC:** Every method returns a `Send` future so the backend can be used
/// from handlers running on a multi-threaded runtime. Implementations may
/// simply write `async fn`.
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache
    /// - `Ok(None)` - Cache miss (key not found)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store value in cache, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Remove value from cache. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if key exists in cache.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }

    /// Bulk delete operation.
    ///
    /// Default implementation calls `delete()` for each key.
    /// Override for batch efficiency (e.g., Redis DEL).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn mdelete(&self, keys: &[&str]) -> impl Future<Output = Result<()>> + Send {
        async move {
            for key in keys {
                self.delete(key).await?;
            }
            Ok(())
        }
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }

    /// Optional: Clear all cache (use with caution).
    ///
    /// # Errors
    /// Returns `Err` if operation is not implemented or fails
    fn clear_all(&self) -> impl Future<Output = Result<()>> + Send {
        async {
            Err(crate::error::Error::Other(
                "clear_all not implemented for this backend".to_string(),
            ))
        }
    }
}
