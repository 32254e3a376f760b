//! Hit-ratio observing decorator.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use strata_core::{Cache, CacheKey, CacheResult, CacheStats};

/// Counts lookups against a wrapped cache and reports the running hit
/// ratio through `tracing`.
///
/// Counters are atomics so concurrent sessions can share the decorated
/// namespace without additional locking. Writes pass through untouched.
pub struct LoggingCache {
    delegate: Box<dyn Cache>,
    hits: AtomicU64,
    requests: AtomicU64,
}

impl LoggingCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        Self {
            delegate,
            hits: AtomicU64::new(0),
            requests: AtomicU64::new(0),
        }
    }

    /// Snapshot of the counters since construction.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let requests = self.requests.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses: requests.saturating_sub(hits),
        }
    }
}

impl Cache for LoggingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> CacheResult<()> {
        self.delegate.put(key, value)
    }

    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let requests = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        let value = self.delegate.get(key)?;
        let hits = if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.hits.load(Ordering::Relaxed)
        };
        tracing::debug!(
            cache_id = self.delegate.id(),
            hit = value.is_some(),
            hit_ratio = hits as f64 / requests as f64,
            "Cache lookup"
        );
        Ok(value)
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> CacheResult<()> {
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}

// ============================================================================
// TESTS
// ============================================================================
