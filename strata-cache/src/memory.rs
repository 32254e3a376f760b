//! In-memory perpetual namespace cache.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use strata_core::{Cache, CacheError, CacheKey, CacheResult};

/// The default namespace store: an unbounded map guarded by a [`RwLock`].
///
/// One instance per namespace, created at configuration time and shared by
/// every session through `Arc<dyn Cache>`. Entries live until removed,
/// cleared, or evicted by a wrapping decorator.
pub struct MemoryCache {
    id: String,
    entries: RwLock<HashMap<CacheKey, Value>>,
}

impl MemoryCache {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned(&self) -> CacheError {
        CacheError::LockPoisoned {
            cache_id: self.id.clone(),
        }
    }
}

impl Cache for MemoryCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: CacheKey, value: Value) -> CacheResult<()> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        entries.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        Ok(entries.remove(key))
    }

    fn clear(&self) -> CacheResult<()> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        entries.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
