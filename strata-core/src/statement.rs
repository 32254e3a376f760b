//! Statement descriptors.
//!
//! A [`Statement`] describes one mapped SQL operation: its stable id, how it
//! executes, its parameter mapping list, and which namespace cache (if any)
//! its results flow through. Descriptors are built at configuration time and
//! shared read-only by every session.

use crate::cache::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// How a statement is executed against the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// A prepared statement.
    Prepared,
    /// A stored-procedure call. Callable statements with non-input
    /// parameters cannot be cached.
    Callable,
}

/// Direction of a mapped parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterMode {
    In,
    Out,
    InOut,
}

/// One entry of a statement's parameter mapping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// Property of the parameter object this mapping binds.
    pub property: String,
    /// Direction of the parameter.
    pub mode: ParameterMode,
}

impl ParameterMapping {
    pub fn input(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            mode: ParameterMode::In,
        }
    }

    pub fn output(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            mode: ParameterMode::Out,
        }
    }
}

/// SQL resolved for one execution: the text plus its parameter mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSql {
    pub sql: String,
    pub parameter_mappings: Vec<ParameterMapping>,
}

/// Pagination bounds applied to a query's result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowBounds {
    pub offset: usize,
    pub limit: usize,
}

impl RowBounds {
    /// Unbounded: offset 0, no limit.
    pub const DEFAULT: RowBounds = RowBounds {
        offset: 0,
        limit: usize::MAX,
    };

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A mapped SQL statement descriptor.
///
/// The namespace cache, when present, is the long-lived [`Cache`] instance
/// shared by every statement of the same namespace. `use_cache` gates
/// whether query results flow through it; `flush_cache_required` forces the
/// namespace to be cleared before the statement executes.
#[derive(Clone)]
pub struct Statement {
    pub id: String,
    pub kind: StatementKind,
    pub sql: String,
    pub parameter_mappings: Vec<ParameterMapping>,
    pub cache: Option<Arc<dyn Cache>>,
    pub use_cache: bool,
    pub flush_cache_required: bool,
}

impl Statement {
    /// Create a prepared statement with no namespace cache.
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: StatementKind::Prepared,
            sql: sql.into(),
            parameter_mappings: Vec::new(),
            cache: None,
            use_cache: true,
            flush_cache_required: false,
        }
    }

    /// Attach the statement's namespace cache.
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_kind(mut self, kind: StatementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parameter_mappings(mut self, mappings: Vec<ParameterMapping>) -> Self {
        self.parameter_mappings = mappings;
        self
    }

    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_flush_cache_required(mut self, required: bool) -> Self {
        self.flush_cache_required = required;
        self
    }

    /// Resolve the SQL bound for one execution of this statement.
    ///
    /// Dynamic SQL assembly is the mapping layer's concern, not this core's;
    /// the bound text here is the statement's static text. The parameter
    /// object is accepted for interface parity with that layer.
    pub fn bound_sql(&self, _parameter: &Value) -> BoundSql {
        BoundSql {
            sql: self.sql.clone(),
            parameter_mappings: self.parameter_mappings.clone(),
        }
    }

    /// Whether this statement declares any non-input parameter mode.
    pub fn declares_non_input_params(&self) -> bool {
        self.parameter_mappings
            .iter()
            .any(|mapping| mapping.mode != ParameterMode::In)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("sql", &self.sql)
            .field("parameter_mappings", &self.parameter_mappings)
            .field("cache", &self.cache.as_ref().map(|c| c.id().to_string()))
            .field("use_cache", &self.use_cache)
            .field("flush_cache_required", &self.flush_cache_required)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
