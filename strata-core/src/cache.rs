//! The namespace cache capability.
//!
//! One [`Cache`] instance exists per namespace, created at configuration
//! time and shared by every session for the lifetime of the process.
//! Implementations are freely composable by wrapping one cache inside
//! another (eviction, logging, locking); the chain is assembled once at
//! setup and never re-wrapped at runtime.

use crate::error::CacheResult;
use crate::key::CacheKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named key-value container shared across sessions.
///
/// # Values
///
/// Entries are [`serde_json::Value`]s. A stored `Value::Null` is a real
/// entry (the explicit placeholder written at commit for a key that missed
/// and was never filled) and is distinct from absence (`None` from `get`).
///
/// # Concurrency
///
/// Methods take `&self`; implementations must provide their own internal
/// synchronization because many sessions read and write the same namespace
/// cache concurrently. Transaction-scoped buffering above this trait adds
/// no locking of its own.
pub trait Cache: Send + Sync {
    /// Stable identifier of this cache's namespace.
    fn id(&self) -> &str;

    /// Store a value, replacing any previous entry for the key.
    fn put(&self, key: CacheKey, value: Value) -> CacheResult<()>;

    /// Look up a value. `Ok(None)` is a miss; `Ok(Some(Value::Null))` is a
    /// present stored-null entry.
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Remove an entry, returning the previous value if any.
    ///
    /// Only called during rollback, for keys that missed earlier in the
    /// transaction. A lock-based implementation uses this to release the
    /// lock it placed on the key at miss time.
    fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Drop every entry in this namespace.
    fn clear(&self) -> CacheResult<()>;

    /// Number of entries currently stored. Informational only; never
    /// consulted by the transactional core.
    fn size(&self) -> usize;
}

/// Statistics about cache usage, exposed by observing decorators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty = CacheStats::default();
        assert!((empty.hit_rate() - 0.0).abs() < 0.001);
    }
}
