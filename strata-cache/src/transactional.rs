//! Transaction-scoped second-level cache buffer.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use strata_core::{Cache, CacheKey, CacheResult};

/// Buffers one session's writes to a namespace cache until commit.
///
/// Entries put here during a transaction are invisible to every reader,
/// including this session, until [`commit`](TransactionalCache::commit)
/// flushes them into the shared namespace cache. Reads pass straight
/// through to the namespace cache, so other sessions' prior commits are
/// always visible.
///
/// Every `get` that misses is tracked, and resolved exactly once at
/// transaction end: commit writes the pending value or an explicit null
/// placeholder, rollback removes the key. A lock-based namespace cache that
/// locks a key on miss is therefore always released, as long as the session
/// eventually commits or rolls back.
///
/// Exclusively owned by one session; the wrapped namespace cache carries
/// the cross-session synchronization.
pub struct TransactionalCache {
    delegate: Arc<dyn Cache>,
    clear_on_commit: bool,
    pending_writes: HashMap<CacheKey, Value>,
    missed_keys: HashSet<CacheKey>,
}

impl TransactionalCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self {
            delegate,
            clear_on_commit: false,
            pending_writes: HashMap::new(),
            missed_keys: HashSet::new(),
        }
    }

    /// Namespace id of the wrapped cache.
    pub fn id(&self) -> &str {
        self.delegate.id()
    }

    /// Entry count of the wrapped cache. Informational only.
    pub fn size(&self) -> usize {
        self.delegate.size()
    }

    /// Read through to the namespace cache.
    ///
    /// A miss is recorded for lock release at transaction end. After
    /// [`clear`](TransactionalCache::clear) this transaction sees only
    /// misses, since every pre-existing entry is doomed at commit.
    pub fn get(&mut self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let value = self.delegate.get(key)?;
        if value.is_none() {
            self.missed_keys.insert(key.clone());
        }
        if self.clear_on_commit {
            return Ok(None);
        }
        Ok(value)
    }

    /// Buffer a write. Nothing reaches the namespace cache until commit;
    /// a later put for the same key replaces the pending value.
    pub fn put(&mut self, key: CacheKey, value: Value) {
        self.pending_writes.insert(key, value);
    }

    /// Reserved. Entries leave the namespace cache only through the
    /// rollback unlock pass, never through this buffer.
    pub fn remove(&mut self, _key: &CacheKey) -> Option<Value> {
        None
    }

    /// Mark the namespace for erasure at commit and discard the writes
    /// buffered so far.
    pub fn clear(&mut self) {
        self.clear_on_commit = true;
        self.pending_writes.clear();
    }

    /// Publish this transaction's outcome to the namespace cache.
    ///
    /// Clears the namespace first when [`clear`](TransactionalCache::clear)
    /// was called, flushes pending writes, then writes a null placeholder
    /// for every unresolved miss. Errors from the namespace cache propagate;
    /// the buffer is reset only after a fully successful flush.
    pub fn commit(&mut self) -> CacheResult<()> {
        if self.clear_on_commit {
            self.delegate.clear()?;
        }
        self.flush_pending_entries()?;
        self.reset();
        Ok(())
    }

    /// Abandon this transaction's buffered state.
    ///
    /// Missed keys are removed from the namespace cache so a blocking
    /// implementation can release its per-key locks. A failing removal is
    /// reported as a warning and the pass continues; rollback itself never
    /// fails.
    pub fn rollback(&mut self) {
        self.unlock_missed_entries();
        self.reset();
    }

    fn reset(&mut self) {
        self.clear_on_commit = false;
        self.pending_writes.clear();
        self.missed_keys.clear();
    }

    fn flush_pending_entries(&self) -> CacheResult<()> {
        for (key, value) in &self.pending_writes {
            self.delegate.put(key.clone(), value.clone())?;
        }
        for key in &self.missed_keys {
            if !self.pending_writes.contains_key(key) {
                self.delegate.put(key.clone(), Value::Null)?;
            }
        }
        Ok(())
    }

    fn unlock_missed_entries(&self) {
        for key in &self.missed_keys {
            if let Err(error) = self.delegate.remove(key) {
                tracing::warn!(
                    cache_id = self.delegate.id(),
                    key = %key,
                    error = %error,
                    "Unexpected failure notifying a rollback to the cache adapter"
                );
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use serde_json::json;
    use strata_test_utils::{FailingCache, RecordingCache};

    fn key(component: &str) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(&json!(component));
        key
    }

    fn namespace() -> Arc<dyn Cache> {
        Arc::new(MemoryCache::new("person"))
    }

    #[test]
    fn test_read_through_sees_namespace_state() {
        let shared = namespace();
        shared.put(key("k"), json!([1])).unwrap();

        let mut buffer = TransactionalCache::new(Arc::clone(&shared));
        assert_eq!(buffer.get(&key("k")).unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_pending_write_invisible_before_commit() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        buffer.put(key("k"), json!([1]));
        // Invisible to the buffer's own reads and to the namespace.
        assert_eq!(buffer.get(&key("k")).unwrap(), None);
        assert_eq!(shared.get(&key("k")).unwrap(), None);
    }

    #[test]
    fn test_commit_publishes_pending_writes() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        buffer.put(key("k"), json!([1]));
        buffer.commit().unwrap();

        // Visible to a fresh transaction over the same namespace.
        let mut next = TransactionalCache::new(Arc::clone(&shared));
        assert_eq!(next.get(&key("k")).unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_clear_hides_existing_entries_until_commit() {
        let shared = namespace();
        shared.put(key("k"), json!([1])).unwrap();

        let mut buffer = TransactionalCache::new(Arc::clone(&shared));
        buffer.clear();
        assert_eq!(buffer.get(&key("k")).unwrap(), None);
        // The namespace itself is untouched until commit.
        assert_eq!(shared.get(&key("k")).unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_clear_discards_pending_writes() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        buffer.put(key("stale"), json!([1]));
        buffer.clear();
        buffer.put(key("fresh"), json!([2]));
        buffer.commit().unwrap();

        assert_eq!(shared.get(&key("stale")).unwrap(), None);
        assert_eq!(shared.get(&key("fresh")).unwrap(), Some(json!([2])));
    }

    #[test]
    fn test_commit_after_clear_erases_namespace_before_flush() {
        let shared = namespace();
        shared.put(key("old"), json!([1])).unwrap();

        let mut buffer = TransactionalCache::new(Arc::clone(&shared));
        buffer.clear();
        buffer.put(key("new"), json!([2]));
        buffer.commit().unwrap();

        assert_eq!(shared.get(&key("old")).unwrap(), None);
        assert_eq!(shared.get(&key("new")).unwrap(), Some(json!([2])));
    }

    #[test]
    fn test_unwritten_miss_commits_null_placeholder() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        assert_eq!(buffer.get(&key("missed")).unwrap(), None);
        buffer.commit().unwrap();

        // The placeholder is a present entry, not an absence.
        assert_eq!(shared.get(&key("missed")).unwrap(), Some(Value::Null));

        // And a later transaction observes the stored null without
        // re-recording a miss: rollback removes nothing.
        let recording = Arc::new(RecordingCache::wrapping(shared));
        let mut next = TransactionalCache::new(recording.clone() as Arc<dyn Cache>);
        assert_eq!(next.get(&key("missed")).unwrap(), Some(Value::Null));
        next.rollback();
        assert_eq!(recording.count_removes(&key("missed")), 0);
    }

    #[test]
    fn test_written_miss_flushes_value_not_placeholder() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        assert_eq!(buffer.get(&key("k")).unwrap(), None);
        buffer.put(key("k"), json!([7]));
        buffer.commit().unwrap();

        assert_eq!(shared.get(&key("k")).unwrap(), Some(json!([7])));
    }

    #[test]
    fn test_rollback_removes_each_missed_key_once() {
        let recording = Arc::new(RecordingCache::new("person"));
        let mut buffer = TransactionalCache::new(recording.clone() as Arc<dyn Cache>);

        buffer.get(&key("a")).unwrap();
        buffer.get(&key("a")).unwrap(); // repeated miss, tracked once
        buffer.get(&key("b")).unwrap();
        buffer.rollback();

        assert_eq!(recording.count_removes(&key("a")), 1);
        assert_eq!(recording.count_removes(&key("b")), 1);
    }

    #[test]
    fn test_rollback_discards_pending_writes() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        buffer.put(key("k"), json!([1]));
        buffer.rollback();

        assert_eq!(shared.get(&key("k")).unwrap(), None);
        assert_eq!(shared.size(), 0);
    }

    #[test]
    fn test_rollback_survives_adapter_failures() {
        // remove() always fails; rollback must report and continue.
        let failing = Arc::new(FailingCache::new("person"));
        let mut buffer = TransactionalCache::new(failing.clone() as Arc<dyn Cache>);

        buffer.get(&key("a")).unwrap();
        buffer.get(&key("b")).unwrap();
        buffer.rollback(); // must not panic or propagate

        // All missed keys were attempted despite the failures.
        assert_eq!(failing.remove_attempts(), 2);
    }

    #[test]
    fn test_buffer_is_reusable_after_commit() {
        let shared = namespace();
        let mut buffer = TransactionalCache::new(Arc::clone(&shared));

        buffer.clear();
        buffer.get(&key("a")).unwrap();
        buffer.commit().unwrap();

        // Fresh transaction on the same buffer object: no leftover state.
        shared.put(key("b"), json!([2])).unwrap();
        assert_eq!(buffer.get(&key("b")).unwrap(), Some(json!([2])));

        let recording = Arc::new(RecordingCache::wrapping(shared));
        let mut observed = TransactionalCache::new(recording.clone() as Arc<dyn Cache>);
        observed.rollback();
        assert_eq!(recording.total_removes(), 0);
    }

    #[test]
    fn test_commit_flush_failure_propagates() {
        // put() fails on the failing adapter; commit must surface it.
        let failing = Arc::new(FailingCache::new("person").fail_puts());
        let mut buffer = TransactionalCache::new(failing as Arc<dyn Cache>);

        buffer.put(key("k"), json!([1]));
        assert!(buffer.commit().is_err());
    }
}
