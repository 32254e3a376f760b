//! Error types for STRATA operations

use thiserror::Error;

/// Cache layer errors.
///
/// `AdapterFailure` is the non-fatal kind: a third-party cache adapter
/// refused an operation. Callers on the rollback path report it and keep
/// going; callers on the commit path propagate it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache adapter failure in '{cache_id}': {reason}")]
    AdapterFailure { cache_id: String, reason: String },

    #[error("Cache lock poisoned in '{cache_id}'")]
    LockPoisoned { cache_id: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error(
        "Caching stored procedures with OUT params is not supported. \
         Disable caching for statement '{statement_id}'"
    )]
    CallableStatementNotCacheable { statement_id: String },
}

/// Executor errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Executor is already closed")]
    AlreadyClosed,

    #[error("Statement '{statement_id}' failed: {reason}")]
    StatementFailed {
        statement_id: String,
        reason: String,
    },

    #[error("Transaction boundary failed: {reason}")]
    TransactionFailed { reason: String },
}

/// Master error type for all STRATA errors.
#[derive(Debug, Clone, Error)]
pub enum StrataError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}

/// Result type alias for STRATA operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Result type alias for cache layer operations.
pub type CacheResult<T> = Result<T, CacheError>;

// ============================================================================
// TESTS
// ============================================================================
