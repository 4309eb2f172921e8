//! Read-through cache service.
//!
//! [`CacheService`] wraps a [`CacheBackend`] in an `Arc` so every service and
//! handler can hold a cheap clone. It offers three operations:
//!
//! - [`fetch_or_load`](CacheService::fetch_or_load): return the cached value
//!   for a key, or run the loader, store its result and return it.
//! - [`invalidate`](CacheService::invalidate): delete every key an
//!   [`Invalidation`] names.
//! - raw [`get`](CacheService::get) / [`set`](CacheService::set) /
//!   [`delete`](CacheService::delete) for callers that manage keys themselves.
//!
//! ```
//! use shop_kit::backend::InMemoryBackend;
//! use shop_kit::cache::CacheService;
//! use shop_kit::invalidation::Invalidation;
//! use shop_kit::key::CacheKey;
//!
//! # #[tokio::main]
//! # async fn main() -> shop_kit::Result<()> {
//! let cache = CacheService::new(InMemoryBackend::new());
//!
//! let categories: Vec<String> = cache
//!     .fetch_or_load(&CacheKey::Categories, || async {
//!         Ok(vec!["shoes".to_string()])
//!     })
//!     .await?;
//! assert_eq!(categories, vec!["shoes".to_string()]);
//!
//! cache.invalidate(&Invalidation::new().products()).await?;
//! assert!(cache.get::<Vec<String>>("categories").await?.is_none());
//! # Ok(())
//! # }
//! ```

use crate::backend::CacheBackend;
use crate::error::{Error, Result};
use crate::invalidation::Invalidation;
use crate::key::CacheKey;
use crate::observability::{CacheMetrics, LogMetrics};
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

struct Inner<B> {
    backend: B,
    metrics: Arc<dyn CacheMetrics>,
}

/// Shared handle to the cache.
///
/// Clones share the same backend and metrics sink.
pub struct CacheService<B: CacheBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: CacheBackend> Clone for CacheService<B> {
    fn clone(&self) -> Self {
        CacheService {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: CacheBackend> CacheService<B> {
    /// Create a cache service that logs its operations.
    pub fn new(backend: B) -> Self {
        Self::with_metrics(backend, Arc::new(LogMetrics))
    }

    /// Create a cache service with custom metrics.
    pub fn with_metrics(backend: B, metrics: Arc<dyn CacheMetrics>) -> Self {
        CacheService {
            inner: Arc::new(Inner { backend, metrics }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Read and decode a cached value.
    ///
    /// # Errors
    ///
    /// - `Error::BackendError` if the backend is unavailable
    /// - `Error::InvalidCacheEntry`, `Error::VersionMismatch` or
    ///   `Error::DeserializationError` if the stored bytes cannot be decoded
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.backend.get(key).await? {
            Some(bytes) => deserialize_from_cache(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and store a value, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if serialization or the backend write fails.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let start = Instant::now();
        let bytes = serialize_for_cache(value)?;
        self.inner.backend.set(key, bytes).await?;
        self.inner.metrics.record_set(key, start.elapsed());
        Ok(())
    }

    /// Delete keys. Absent keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend delete fails.
    pub async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        if let Err(e) = self.inner.backend.mdelete(&refs).await {
            for key in keys {
                self.inner.metrics.record_error(key, &e.to_string());
            }
            return Err(e);
        }

        let elapsed = start.elapsed();
        for key in keys {
            self.inner.metrics.record_delete(key, elapsed);
        }
        Ok(())
    }

    /// Delete every key named by `invalidation`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend delete fails; the write that triggered
    /// the invalidation has already been applied at that point.
    pub async fn invalidate(&self, invalidation: &Invalidation) -> Result<()> {
        let keys: Vec<String> = invalidation.keys().into_iter().collect();
        if keys.is_empty() {
            return Ok(());
        }

        self.delete(&keys).await?;
        info!("Invalidated {} cache keys: {}", keys.len(), keys.join(", "));
        Ok(())
    }

    /// Read-through lookup.
    ///
    /// On a hit the decoded value is returned. On a miss `loader` runs, its
    /// value is written back and returned. An entry that cannot be decoded is
    /// evicted and treated as a miss. Backend failures on the read or the
    /// write-back are recorded and do not fail the lookup.
    ///
    /// # Errors
    ///
    /// Only errors from `loader` are returned.
    pub async fn fetch_or_load<T, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = key.to_string();
        let start = Instant::now();

        match self.get::<T>(&key).await {
            Ok(Some(value)) => {
                self.inner.metrics.record_hit(&key, start.elapsed());
                return Ok(value);
            }
            Ok(None) => self.inner.metrics.record_miss(&key, start.elapsed()),
            Err(
                e @ (Error::InvalidCacheEntry(_)
                | Error::VersionMismatch { .. }
                | Error::DeserializationError(_)),
            ) => {
                self.inner.metrics.record_error(&key, &e.to_string());
                if let Err(evict) = self.inner.backend.delete(&key).await {
                    self.inner.metrics.record_error(&key, &evict.to_string());
                }
            }
            Err(e) => self.inner.metrics.record_error(&key, &e.to_string()),
        }

        let value = loader().await?;

        if let Err(e) = self.set(&key, &value).await {
            self.inner.metrics.record_error(&key, &e.to_string());
        }

        Ok(value)
    }

    /// Verify the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the backend cannot be reached.
    pub async fn health_check(&self) -> Result<bool> {
        self.inner.backend.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::observability::CounterMetrics;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn service() -> (CacheService<InMemoryBackend>, Arc<CounterMetrics>) {
        let metrics = Arc::new(CounterMetrics::new());
        let service = CacheService::with_metrics(InMemoryBackend::new(), metrics.clone());
        (service, metrics)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (cache, metrics) = service();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .fetch_or_load(&CacheKey::Categories, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["shoes".to_string()])
                })
                .await
                .expect("Failed to load");
            assert_eq!(value, vec!["shoes".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.sets, 1);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let (cache, _) = service();

        let result: Result<Vec<String>> = cache
            .fetch_or_load(&CacheKey::AllProducts, || async {
                Err(Error::RepositoryError("store down".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.backend().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_evicted_and_reloaded() {
        let (cache, metrics) = service();
        cache
            .backend()
            .set("categories", b"not an envelope".to_vec())
            .await
            .expect("Failed to seed");

        let value: Vec<String> = cache
            .fetch_or_load(&CacheKey::Categories, || async {
                Ok(vec!["laptops".to_string()])
            })
            .await
            .expect("Failed to load");

        assert_eq!(value, vec!["laptops".to_string()]);
        assert_eq!(metrics.snapshot().errors, 1);
        let cached: Option<Vec<String>> = cache.get("categories").await.expect("Failed to get");
        assert_eq!(cached, Some(vec!["laptops".to_string()]));
    }

    #[tokio::test]
    async fn test_invalidate_deletes_named_keys_only() {
        let (cache, _) = service();
        let product = Uuid::now_v7();
        for key in [
            "latest-products".to_string(),
            "categories".to_string(),
            "all-products".to_string(),
            format!("product-{}", product),
            "admin-stats".to_string(),
            "all-orders".to_string(),
        ] {
            cache.set(&key, &1u8).await.expect("Failed to set");
        }

        cache
            .invalidate(&Invalidation::new().products().product_id(product))
            .await
            .expect("Failed to invalidate");

        assert_eq!(
            cache.backend().keys(),
            vec!["admin-stats".to_string(), "all-orders".to_string()]
        );
    }

    #[test]
    fn test_clones_share_backend() {
        let (cache, _) = service();
        let clone = cache.clone();
        assert!(Arc::ptr_eq(&cache.inner, &clone.inner));
    }
}
