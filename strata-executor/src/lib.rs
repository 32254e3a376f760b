//! STRATA Executor - Statement Execution Pipeline
//!
//! Runs statements through a pluggable [`StatementRunner`] and layers the
//! two cache levels on top:
//!
//! - [`SimpleExecutor`] owns the session-scoped first-level cache and the
//!   transaction boundary against the runner.
//! - [`CachingExecutor`] decorates any executor with the shared second-level
//!   cache, buffering writes per transaction through
//!   `strata_cache::TransactionalCacheManager`.
//!
//! The usual stack is `CachingExecutor<SimpleExecutor<R>>`.

pub mod caching;
pub mod simple;
pub mod traits;

pub use caching::CachingExecutor;
pub use simple::SimpleExecutor;
pub use traits::{Executor, ResultHandler, StatementRunner};
