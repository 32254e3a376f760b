//! Namespace cache configuration.
//!
//! A namespace declares its cache once at configuration time; the builder
//! assembles the decorator chain here and hands back the shared
//! `Arc<dyn Cache>` every statement of that namespace references. There is
//! no re-wrapping after build.

use std::sync::Arc;
use strata_core::{Cache, ConfigError, StrataResult};

use crate::logging::LoggingCache;
use crate::lru::LruCache;
use crate::memory::MemoryCache;

/// Builds one namespace cache chain: [`MemoryCache`] innermost, optional
/// [`LruCache`] bound, optional [`LoggingCache`] outermost.
#[derive(Debug, Clone)]
pub struct NamespaceCacheBuilder {
    id: String,
    lru_capacity: Option<usize>,
    logging: bool,
}

impl NamespaceCacheBuilder {
    /// Start a chain for the namespace with the given stable id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lru_capacity: None,
            logging: false,
        }
    }

    /// Bound the namespace to `capacity` entries with LRU eviction.
    pub fn with_lru(mut self, capacity: usize) -> Self {
        self.lru_capacity = Some(capacity);
        self
    }

    /// Wrap the chain in a hit-ratio observing decorator.
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Validate and assemble the chain.
    pub fn build(self) -> StrataResult<Arc<dyn Cache>> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "id".to_string(),
            }
            .into());
        }
        if let Some(0) = self.lru_capacity {
            return Err(ConfigError::InvalidValue {
                field: "lru_capacity".to_string(),
                value: "0".to_string(),
                reason: "LRU capacity must be greater than 0".to_string(),
            }
            .into());
        }

        let mut chain: Box<dyn Cache> = Box::new(MemoryCache::new(self.id));
        if let Some(capacity) = self.lru_capacity {
            chain = Box::new(LruCache::new(chain, capacity));
        }
        if self.logging {
            chain = Box::new(LoggingCache::new(chain));
        }
        Ok(Arc::from(chain))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_core::{CacheKey, ConfigError, StrataError};

    fn key(component: &str) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(&json!(component));
        key
    }

    #[test]
    fn test_builds_plain_namespace() {
        let cache = NamespaceCacheBuilder::new("person").build().unwrap();
        assert_eq!(cache.id(), "person");
        cache.put(key("k"), json!(1)).unwrap();
        assert_eq!(cache.get(&key("k")).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_chain_preserves_namespace_id() {
        let cache = NamespaceCacheBuilder::new("dept")
            .with_lru(16)
            .with_logging(true)
            .build()
            .unwrap();
        assert_eq!(cache.id(), "dept");
    }

    #[test]
    fn test_lru_bound_applies_through_chain() {
        let cache = NamespaceCacheBuilder::new("dept").with_lru(1).build().unwrap();
        cache.put(key("a"), json!(1)).unwrap();
        cache.put(key("b"), json!(2)).unwrap();
        assert_eq!(cache.get(&key("a")).unwrap(), None);
        assert_eq!(cache.get(&key("b")).unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_empty_id_is_config_error() {
        let result = NamespaceCacheBuilder::new("  ").build();
        assert!(matches!(
            result,
            Err(StrataError::Config(ConfigError::MissingRequired { field })) if field == "id"
        ));
    }

    #[test]
    fn test_zero_capacity_is_config_error() {
        let result = NamespaceCacheBuilder::new("dept").with_lru(0).build();
        assert!(matches!(
            result,
            Err(StrataError::Config(ConfigError::InvalidValue { field, .. })) if field == "lru_capacity"
        ));
    }
}
