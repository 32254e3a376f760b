//! STRATA Test Utilities
//!
//! Centralized test infrastructure for the STRATA workspace:
//! - A recording cache that logs every operation for exact-count assertions
//! - A failing cache for adapter-warning and commit-propagation tests
//! - Statement fixtures for the caching-executor scenarios
//!
//! Consumed from `[dev-dependencies]` only.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use strata_core::{
    Cache, CacheError, CacheKey, CacheResult, ParameterMapping, Statement, StatementKind,
};

// ============================================================================
// RECORDING CACHE
// ============================================================================

/// One observed cache operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    Get(CacheKey),
    Put(CacheKey),
    Remove(CacheKey),
    Clear,
}

/// Cache double that records every operation before delegating.
///
/// By default it delegates to its own in-memory map; `wrapping` lets a test
/// observe traffic against an existing shared namespace cache instead.
pub struct RecordingCache {
    id: String,
    ops: Mutex<Vec<CacheOp>>,
    store: Store,
}

enum Store {
    Owned(Mutex<HashMap<CacheKey, Value>>),
    Wrapped(Arc<dyn Cache>),
}

impl RecordingCache {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ops: Mutex::new(Vec::new()),
            store: Store::Owned(Mutex::new(HashMap::new())),
        }
    }

    pub fn wrapping(inner: Arc<dyn Cache>) -> Self {
        Self {
            id: inner.id().to_string(),
            ops: Mutex::new(Vec::new()),
            store: Store::Wrapped(inner),
        }
    }

    /// Every operation observed so far, in order.
    pub fn ops(&self) -> Vec<CacheOp> {
        self.ops.lock().expect("ops lock").clone()
    }

    /// How many times `remove` was invoked for `key`.
    pub fn count_removes(&self, key: &CacheKey) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, CacheOp::Remove(removed) if removed == key))
            .count()
    }

    /// How many `remove` calls were observed in total.
    pub fn total_removes(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, CacheOp::Remove(_)))
            .count()
    }

    /// How many `put` calls were observed for `key`.
    pub fn count_puts(&self, key: &CacheKey) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, CacheOp::Put(put) if put == key))
            .count()
    }

    /// How many `clear` calls were observed.
    pub fn count_clears(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, CacheOp::Clear))
            .count()
    }

    fn record(&self, op: CacheOp) {
        self.ops.lock().expect("ops lock").push(op);
    }
}

impl Cache for RecordingCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: CacheKey, value: Value) -> CacheResult<()> {
        self.record(CacheOp::Put(key.clone()));
        match &self.store {
            Store::Owned(map) => {
                map.lock().expect("store lock").insert(key, value);
                Ok(())
            }
            Store::Wrapped(inner) => inner.put(key, value),
        }
    }

    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        self.record(CacheOp::Get(key.clone()));
        match &self.store {
            Store::Owned(map) => Ok(map.lock().expect("store lock").get(key).cloned()),
            Store::Wrapped(inner) => inner.get(key),
        }
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        self.record(CacheOp::Remove(key.clone()));
        match &self.store {
            Store::Owned(map) => Ok(map.lock().expect("store lock").remove(key)),
            Store::Wrapped(inner) => inner.remove(key),
        }
    }

    fn clear(&self) -> CacheResult<()> {
        self.record(CacheOp::Clear);
        match &self.store {
            Store::Owned(map) => {
                map.lock().expect("store lock").clear();
                Ok(())
            }
            Store::Wrapped(inner) => inner.clear(),
        }
    }

    fn size(&self) -> usize {
        match &self.store {
            Store::Owned(map) => map.lock().expect("store lock").len(),
            Store::Wrapped(inner) => inner.size(),
        }
    }
}

// ============================================================================
// FAILING CACHE
// ============================================================================

/// Cache double whose `remove` (and optionally `put`) always fails with
/// [`CacheError::AdapterFailure`], for the rollback-warning and
/// commit-propagation tests.
pub struct FailingCache {
    id: String,
    entries: Mutex<HashMap<CacheKey, Value>>,
    fail_puts: bool,
    remove_attempts: AtomicUsize,
}

impl FailingCache {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Mutex::new(HashMap::new()),
            fail_puts: false,
            remove_attempts: AtomicUsize::new(0),
        }
    }

    /// Also fail every `put`, for commit-path tests.
    pub fn fail_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    /// Number of `remove` calls attempted against this adapter.
    pub fn remove_attempts(&self) -> usize {
        self.remove_attempts.load(Ordering::Relaxed)
    }

    fn failure(&self) -> CacheError {
        CacheError::AdapterFailure {
            cache_id: self.id.clone(),
            reason: "simulated adapter failure".to_string(),
        }
    }
}

impl Cache for FailingCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: CacheKey, value: Value) -> CacheResult<()> {
        if self.fail_puts {
            return Err(self.failure());
        }
        self.entries.lock().expect("entries lock").insert(key, value);
        Ok(())
    }

    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        Ok(self.entries.lock().expect("entries lock").get(key).cloned())
    }

    fn remove(&self, _key: &CacheKey) -> CacheResult<Option<Value>> {
        self.remove_attempts.fetch_add(1, Ordering::Relaxed);
        Err(self.failure())
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries.lock().expect("entries lock").clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.entries.lock().expect("entries lock").len()
    }
}

// ============================================================================
// STATEMENT FIXTURES
// ============================================================================

/// A cacheable query bound to `cache`'s namespace.
pub fn cacheable_query(id: &str, cache: Arc<dyn Cache>) -> Statement {
    Statement::new(id, format!("SELECT * FROM t /* {id} */")).with_cache(cache)
}

/// A query whose statement opted out of the second-level cache.
pub fn uncached_query(id: &str, cache: Arc<dyn Cache>) -> Statement {
    Statement::new(id, format!("SELECT * FROM t /* {id} */"))
        .with_cache(cache)
        .with_use_cache(false)
}

/// An update that requires its namespace cache to be flushed first.
pub fn flush_required_update(id: &str, cache: Arc<dyn Cache>) -> Statement {
    Statement::new(id, format!("UPDATE t SET v = ? /* {id} */"))
        .with_cache(cache)
        .with_flush_cache_required(true)
}

/// A cacheable stored-procedure call declaring an OUT parameter, the
/// illegal configuration the executor must reject.
pub fn callable_with_out_param(id: &str, cache: Arc<dyn Cache>) -> Statement {
    Statement::new(id, format!("{{call proc(?, ?)}} /* {id} */"))
        .with_kind(StatementKind::Callable)
        .with_cache(cache)
        .with_parameter_mappings(vec![
            ParameterMapping::input("id"),
            ParameterMapping::output("result"),
        ])
}
