//! Concurrent response store with per-entry expiration.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::cache::entry::CachedResponse;
use crate::observability::metrics;

/// A thread-safe map from cache key to captured response.
///
/// Cloning is cheap; every clone shares the same entries. Each `store`
/// schedules its own eviction which fires once, unconditionally, even if
/// the key has been overwritten since.
#[derive(Clone, Default)]
pub struct CacheStore {
    inner: Arc<DashMap<String, Arc<CachedResponse>>>,
}

impl CacheStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for `key`, if present.
    pub fn lookup(&self, key: &str) -> Option<Arc<CachedResponse>> {
        self.inner.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Insert or overwrite `key` and schedule its removal after `ttl`.
    ///
    /// Must be called from within a Tokio runtime; the eviction runs as a
    /// spawned task.
    pub fn store(&self, key: impl Into<String>, response: CachedResponse, ttl: Duration) {
        let key = key.into();
        self.inner.insert(key.clone(), Arc::new(response));
        metrics::record_cache_size(self.inner.len());

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "No runtime to schedule eviction; dropping entry");
                self.delete(&key);
                return;
            }
        };

        let store = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            store.delete(&key);
            metrics::record_cache_eviction();
            tracing::debug!(key = %key, "Cache entry expired");
        });
    }

    /// Remove `key` if present. Calling it for a missing key is a no-op.
    pub fn delete(&self, key: &str) {
        if self.inner.remove(key).is_some() {
            metrics::record_cache_size(self.inner.len());
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
