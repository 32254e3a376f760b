//! STRATA Cache - Namespace Caches and the Transactional Buffer
//!
//! Implementations of the [`Cache`](strata_core::Cache) capability plus the
//! transaction-scoped machinery that defers second-level cache writes until
//! commit.
//!
//! # Composition
//!
//! A namespace cache is a chain of wrappers assembled once at configuration
//! time by [`NamespaceCacheBuilder`]: the perpetual [`MemoryCache`] store,
//! optionally bounded by [`LruCache`], optionally observed by
//! [`LoggingCache`]. Sessions never see the chain: they hold an
//! `Arc<dyn Cache>` and go through their own [`TransactionalCache`] buffer,
//! resolved per namespace by the session's [`TransactionalCacheManager`].
//!
//! # Visibility
//!
//! Writes buffered during a transaction are invisible everywhere (other
//! sessions *and* the writing session) until commit. Reads always reflect
//! the namespace cache's current state, including other sessions' prior
//! commits. Misses are tracked and explicitly resolved at commit (value or
//! null placeholder) or rollback (removal), which is what lets a blocking
//! namespace cache release per-key locks safely.

pub mod builder;
pub mod logging;
pub mod lru;
pub mod manager;
pub mod memory;
pub mod transactional;

pub use builder::NamespaceCacheBuilder;
pub use logging::LoggingCache;
pub use lru::LruCache;
pub use manager::TransactionalCacheManager;
pub use memory::MemoryCache;
pub use transactional::TransactionalCache;
