//! Composite cache key fingerprinting.
//!
//! A [`CacheKey`] identifies one statement + parameter + bounds combination.
//! Two keys are equal iff they were built from the same components in the
//! same order. Keys must hash stably because they are used as map keys in
//! every cache in the chain, across sessions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Composite fingerprint used as the lookup key for cached query results.
///
/// Components are appended in a fixed order (statement id, bounds, bound SQL,
/// parameter values) and stored in their canonical JSON encoding, so that
/// value-equal parameters always produce the same key regardless of how the
/// caller constructed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    components: Vec<String>,
}

impl CacheKey {
    /// Create an empty key. Components are appended with [`CacheKey::update`].
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Append one component in its canonical JSON encoding.
    ///
    /// Order matters: the same components appended in a different order
    /// produce a different key.
    pub fn update(&mut self, component: &serde_json::Value) {
        // `Display` on Value is the compact JSON encoding, which is stable
        // for a given value.
        self.components.push(component.to_string());
    }

    /// Append every component of a slice, in order.
    pub fn update_all(&mut self, components: &[serde_json::Value]) {
        for component in components {
            self.update(component);
        }
    }

    /// Number of components appended so far.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// SHA-256 digest over all components, stable across processes.
    ///
    /// Each component is fed to the hasher length-prefixed so that component
    /// boundaries cannot be forged by concatenation.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for component in &self.components {
            hasher.update((component.len() as u64).to_be_bytes());
            hasher.update(component.as_bytes());
        }
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digest = self.digest();
        write!(
            f,
            "{}:{}",
            hex::encode(&digest[..8]),
            self.components.len()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_component() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            any::<bool>().prop_map(|b| serde_json::json!(b)),
            "[a-zA-Z0-9_.]{0,24}".prop_map(|s| serde_json::json!(s)),
            Just(serde_json::Value::Null),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Keys built from the same component sequence are equal and share
        /// a digest.
        #[test]
        fn prop_same_components_same_key(components in prop::collection::vec(arb_component(), 0..8)) {
            let mut a = CacheKey::new();
            let mut b = CacheKey::new();
            a.update_all(&components);
            b.update_all(&components);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.digest(), b.digest());
        }

        /// Appending one extra component always changes the key.
        #[test]
        fn prop_extra_component_changes_key(
            components in prop::collection::vec(arb_component(), 0..8),
            extra in arb_component(),
        ) {
            let mut a = CacheKey::new();
            a.update_all(&components);
            let mut b = a.clone();
            b.update(&extra);
            prop_assert_ne!(a, b);
        }

        /// Cloning preserves equality, digest, and hash-map identity.
        #[test]
        fn prop_clone_is_identical(components in prop::collection::vec(arb_component(), 0..8)) {
            let mut key = CacheKey::new();
            key.update_all(&components);
            let clone = key.clone();
            prop_assert_eq!(&key, &clone);
            prop_assert_eq!(key.digest(), clone.digest());

            let mut map = std::collections::HashMap::new();
            map.insert(key, 1u8);
            prop_assert_eq!(map.get(&clone), Some(&1u8));
        }
    }
}
