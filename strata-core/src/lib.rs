//! STRATA Core - Contracts and Data Types
//!
//! The capability traits and pure data types shared by the whole workspace:
//! the namespace [`Cache`] contract, composite [`CacheKey`] fingerprints,
//! statement descriptors, and the error family. Implementations live in
//! `strata-cache` and `strata-executor`.

pub mod cache;
pub mod error;
pub mod key;
pub mod statement;

pub use cache::{Cache, CacheStats};
pub use error::{
    CacheError, CacheResult, ConfigError, ExecutorError, StrataError, StrataResult,
};
pub use key::CacheKey;
pub use statement::{
    BoundSql, ParameterMapping, ParameterMode, RowBounds, Statement, StatementKind,
};

/// One result row, as materialized by the row-mapping layer.
pub type Row = serde_json::Value;
