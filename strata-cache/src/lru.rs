//! Least-recently-used eviction decorator.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use strata_core::{Cache, CacheError, CacheKey, CacheResult};

/// Bounds a wrapped cache by evicting its least-recently-used keys.
///
/// The decorator owns only the recency bookkeeping; entries live in the
/// delegate and are evicted through its `remove`. Capacity counts keys
/// written through this decorator, so it must be the only write path to
/// the delegate; the builder guarantees that by assembling the chain once
/// at setup time.
pub struct LruCache {
    delegate: Box<dyn Cache>,
    capacity: usize,
    recency: Mutex<VecDeque<CacheKey>>,
}

impl LruCache {
    pub fn new(delegate: Box<dyn Cache>, capacity: usize) -> Self {
        Self {
            delegate,
            capacity,
            recency: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn poisoned(&self) -> CacheError {
        CacheError::LockPoisoned {
            cache_id: self.delegate.id().to_string(),
        }
    }

    /// Move `key` to the most-recent position.
    fn touch(&self, key: &CacheKey) -> CacheResult<()> {
        let mut recency = self.recency.lock().map_err(|_| self.poisoned())?;
        recency.retain(|tracked| tracked != key);
        recency.push_back(key.clone());
        Ok(())
    }
}

impl Cache for LruCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: CacheKey, value: Value) -> CacheResult<()> {
        self.delegate.put(key.clone(), value)?;
        self.touch(&key)?;

        loop {
            let oldest = {
                let mut recency = self.recency.lock().map_err(|_| self.poisoned())?;
                if recency.len() <= self.capacity {
                    break;
                }
                recency.pop_front()
            };
            if let Some(oldest) = oldest {
                self.delegate.remove(&oldest)?;
            }
        }
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let value = self.delegate.get(key)?;
        if value.is_some() {
            self.touch(key)?;
        }
        Ok(value)
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let previous = self.delegate.remove(key)?;
        let mut recency = self.recency.lock().map_err(|_| self.poisoned())?;
        recency.retain(|tracked| tracked != key);
        Ok(previous)
    }

    fn clear(&self) -> CacheResult<()> {
        self.delegate.clear()?;
        let mut recency = self.recency.lock().map_err(|_| self.poisoned())?;
        recency.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}

// ============================================================================
// TESTS
// ============================================================================
