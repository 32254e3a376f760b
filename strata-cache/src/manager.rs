//! Per-session registry of transactional buffers.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::{Cache, CacheKey, CacheResult};

use crate::transactional::TransactionalCache;

/// Owns one [`TransactionalCache`] per namespace touched by a session,
/// keyed by the namespace cache's stable string id.
///
/// Buffers are created lazily on first reference and live until the
/// session is dropped; `commit_all`/`rollback_all` reset them in place so
/// the next transaction of the same session reuses them.
///
/// Commit fans out sequentially with no cross-namespace atomicity: the
/// first failing namespace propagates its error, and namespaces flushed
/// before it stay flushed. Fan-out order across namespaces is unspecified.
#[derive(Default)]
pub struct TransactionalCacheManager {
    buffers: HashMap<String, TransactionalCache>,
}

impl TransactionalCacheManager {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
        }
    }

    /// Number of namespaces this session has touched.
    pub fn namespace_count(&self) -> usize {
        self.buffers.len()
    }

    /// Read `key` through the buffer for `cache`'s namespace.
    pub fn get(&mut self, cache: &Arc<dyn Cache>, key: &CacheKey) -> CacheResult<Option<Value>> {
        self.transactional(cache).get(key)
    }

    /// Buffer a write for `cache`'s namespace.
    pub fn put(&mut self, cache: &Arc<dyn Cache>, key: CacheKey, value: Value) {
        self.transactional(cache).put(key, value);
    }

    /// Mark `cache`'s namespace for erasure at commit.
    pub fn clear(&mut self, cache: &Arc<dyn Cache>) {
        self.transactional(cache).clear();
    }

    /// Commit every registered buffer, sequentially.
    pub fn commit_all(&mut self) -> CacheResult<()> {
        for buffer in self.buffers.values_mut() {
            buffer.commit()?;
        }
        Ok(())
    }

    /// Roll back every registered buffer. Never fails; individual adapter
    /// failures are reported by the buffers themselves.
    pub fn rollback_all(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.rollback();
        }
    }

    fn transactional(&mut self, cache: &Arc<dyn Cache>) -> &mut TransactionalCache {
        self.buffers
            .entry(cache.id().to_string())
            .or_insert_with(|| TransactionalCache::new(Arc::clone(cache)))
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
    use strata_test_utils::RecordingCache;

    fn key(component: &str) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(&json!(component));
        key
    }

    fn namespace(id: &str) -> Arc<dyn Cache> {
        Arc::new(MemoryCache::new(id))
    }

    #[test]
    fn test_buffers_created_lazily_per_namespace() {
        let person = namespace("person");
        let dept = namespace("dept");
        let mut manager = TransactionalCacheManager::new();
        assert_eq!(manager.namespace_count(), 0);

        manager.get(&person, &key("k")).unwrap();
        assert_eq!(manager.namespace_count(), 1);

        manager.get(&dept, &key("k")).unwrap();
        assert_eq!(manager.namespace_count(), 2);

        // Re-touching a namespace reuses its buffer.
        manager.put(&person, key("k"), json!([1]));
        assert_eq!(manager.namespace_count(), 2);
    }

    #[test]
    fn test_same_id_shares_one_buffer() {
        let shared = namespace("person");
        let alias = Arc::clone(&shared);
        let mut manager = TransactionalCacheManager::new();

        manager.put(&shared, key("k"), json!([1]));
        manager.put(&alias, key("k2"), json!([2]));
        assert_eq!(manager.namespace_count(), 1);
    }

    #[test]
    fn test_commit_all_fans_out() {
        let person = namespace("person");
        let dept = namespace("dept");
        let mut manager = TransactionalCacheManager::new();

        manager.put(&person, key("p"), json!([1]));
        manager.put(&dept, key("d"), json!([2]));
        manager.commit_all().unwrap();

        assert_eq!(person.get(&key("p")).unwrap(), Some(json!([1])));
        assert_eq!(dept.get(&key("d")).unwrap(), Some(json!([2])));
    }

    #[test]
    fn test_rollback_all_fans_out() {
        let person: Arc<RecordingCache> = Arc::new(RecordingCache::new("person"));
        let dept: Arc<RecordingCache> = Arc::new(RecordingCache::new("dept"));
        let mut manager = TransactionalCacheManager::new();

        manager.get(&(person.clone() as Arc<dyn Cache>), &key("p")).unwrap();
        manager.get(&(dept.clone() as Arc<dyn Cache>), &key("d")).unwrap();
        manager.rollback_all();

        assert_eq!(person.count_removes(&key("p")), 1);
        assert_eq!(dept.count_removes(&key("d")), 1);
    }

    #[test]
    fn test_clear_resolves_then_delegates() {
        let person = namespace("person");
        person.put(key("k"), json!([1])).unwrap();
        let mut manager = TransactionalCacheManager::new();

        manager.clear(&person);
        // Present underneath, so hidden by the pending clear but not a miss.
        assert_eq!(manager.get(&person, &key("k")).unwrap(), None);
        // Genuinely absent, so a recorded miss.
        assert_eq!(manager.get(&person, &key("absent")).unwrap(), None);

        manager.commit_all().unwrap();
        assert_eq!(person.get(&key("k")).unwrap(), None);
        assert_eq!(person.get(&key("absent")).unwrap(), Some(Value::Null));
        assert_eq!(person.size(), 1);
    }

    #[test]
    fn test_commit_all_propagates_first_failure() {
        use strata_test_utils::FailingCache;

        let healthy = namespace("person");
        let failing: Arc<dyn Cache> = Arc::new(FailingCache::new("dept").fail_puts());
        let mut manager = TransactionalCacheManager::new();

        manager.put(&healthy, key("p"), json!([1]));
        manager.put(&failing, key("d"), json!([2]));

        // Fan-out order is unspecified, so only the propagation is
        // asserted; namespaces flushed before the failure stay flushed.
        assert!(manager.commit_all().is_err());
    }

    #[test]
    fn test_buffers_reusable_across_transactions() {
        let person = namespace("person");
        let mut manager = TransactionalCacheManager::new();

        manager.put(&person, key("k"), json!([1]));
        manager.commit_all().unwrap();

        // Second transaction on the same manager sees the committed value.
        assert_eq!(manager.get(&person, &key("k")).unwrap(), Some(json!([1])));
        assert_eq!(manager.namespace_count(), 1);
    }
}
