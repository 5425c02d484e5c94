//! Keyed read-through cache for network lookups, using moka
//!
//! Guarantees per key:
//! - at most one load in flight; concurrent callers share its result
//! - a landed value is reused until the staleness window elapses, then the
//!   next call loads again
//! - a failed load is not stored; the next caller starts from scratch
//!
//! Each lookup domain owns its own instance, so keys never collide across
//! domains.

use moka::future::Cache;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Number of entries in cache (approximate until pending tasks run)
    pub entry_count: u64,
    /// Number of loads actually started
    pub loads: u64,
}

/// Staleness-windowed, in-flight-deduplicating cache
#[derive(Clone)]
pub struct ContentCache<V> {
    name: &'static str,
    inner: Cache<String, V>,
    staleness: Duration,
    loads: Arc<AtomicU64>,
}

impl<V> ContentCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create cache with max capacity and staleness window
    #[must_use]
    pub fn new(name: &'static str, max_capacity: u64, staleness: Duration) -> Self {
        Self {
            name,
            inner: Cache::builder()
                .name(name)
                .max_capacity(max_capacity)
                .time_to_live(staleness)
                .build(),
            staleness,
            loads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return the fresh value for `key`, or run `loader` to produce one
    ///
    /// Concurrent callers for the same key await the same load. An `Err`
    /// from the loader is handed to every waiting caller and not stored.
    ///
    /// # Errors
    /// The loader's error, shared between the callers that awaited it.
    pub async fn fetch<F, E>(&self, key: impl Into<String>, loader: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        let key = key.into();
        let load = self.counted(&key, loader);
        self.inner.try_get_with(key, load).await
    }

    /// Like [`ContentCache::fetch`] for loaders that cannot fail
    pub async fn fetch_with<F>(&self, key: impl Into<String>, loader: F) -> V
    where
        F: Future<Output = V>,
    {
        let key = key.into();
        let load = self.counted(&key, loader);
        self.inner.get_with(key, load).await
    }

    fn counted<F: Future>(&self, key: &str, loader: F) -> impl Future<Output = F::Output> {
        let loads = Arc::clone(&self.loads);
        let name = self.name;
        let key = key.to_string();
        async move {
            loads.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(cache = name, key = %key, "cache load");
            loader.await
        }
    }

    /// Fresh cached value without loading
    #[inline]
    pub async fn peek(&self, key: &str) -> Option<V> {
        self.inner.get(key).await
    }

    /// Drop one entry
    #[inline]
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Flush moka's pending maintenance so counts are exact
    #[inline]
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Staleness window of this instance
    #[inline]
    #[must_use]
    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Cache name used in logs
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }
}

impl<V> fmt::Debug for ContentCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCache")
            .field("name", &self.name)
            .field("staleness", &self.staleness)
            .field("loads", &self.loads.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
