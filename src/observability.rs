//! Observability hooks for cache operations.
//!
//! [`CacheService`](crate::cache::CacheService) reports every hit, miss,
//! write, invalidation and tolerated failure to a [`CacheMetrics`]
//! implementation. The default methods log through the `log` crate, so a
//! service built with [`LogMetrics`] behaves like a verbose cache without any
//! extra wiring.
//!
//! Implement the trait to forward the events to a monitoring system:
//!
//! ```
//! use shop_kit::observability::CacheMetrics;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct HitCounter {
//!     hits: AtomicU64,
//! }
//!
//! impl CacheMetrics for HitCounter {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         self.hits.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```
//!
//! | Method            | Fired when                                         |
//! |-------------------|----------------------------------------------------|
//! | `record_hit`      | a key was found and decoded                        |
//! | `record_miss`     | a key was absent and the loader ran                |
//! | `record_set`      | a freshly loaded value was written back            |
//! | `record_delete`   | keys were removed by an invalidation               |
//! | `record_error`    | a cache failure was tolerated (evict, failed write) |

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Metrics that only log, using the trait defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// Silent metrics, for benchmarks.
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// In-process counters, exposed on the health endpoint and used by tests.
#[derive(Debug, Default)]
pub struct CounterMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}

impl CounterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for CounterMetrics {
    fn record_hit(&self, key: &str, duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    fn record_miss(&self, key: &str, duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    fn record_set(&self, key: &str, duration: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    fn record_delete(&self, key: &str, duration: Duration) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    fn record_error(&self, key: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!("Cache ERROR for {}: {}", key, error);
    }
}
