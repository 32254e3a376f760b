//! Executor capabilities.
//!
//! [`Executor`] is the query-executing seam of a session. Decorators such as
//! the caching executor implement it by wrapping another executor, so they
//! are drop-in substitutes anywhere a delegate is expected.

use serde_json::Value;
use strata_core::{BoundSql, CacheKey, Row, RowBounds, Statement, StrataResult};

/// Streaming consumer for query results.
///
/// Supplying a handler bypasses both cache levels: streamed results are
/// never cacheable.
pub trait ResultHandler {
    fn handle(&mut self, row: &Row);
}

/// A session's query-executing capability.
///
/// One executor per session; not shared across threads. Transaction
/// boundaries (`commit`, `rollback`, `close`) belong to the session that
/// owns the executor.
pub trait Executor {
    /// Execute a query, resolving the bound SQL and cache key first.
    fn query(
        &mut self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
    ) -> StrataResult<Vec<Row>> {
        let bound_sql = statement.bound_sql(parameter);
        let key = self.create_cache_key(statement, parameter, bounds, &bound_sql);
        self.query_with_key(statement, parameter, bounds, handler, &key, &bound_sql)
    }

    /// Execute a query whose key and bound SQL were already resolved.
    fn query_with_key(
        &mut self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
        key: &CacheKey,
        bound_sql: &BoundSql,
    ) -> StrataResult<Vec<Row>>;

    /// Execute a write statement, returning the affected-row count.
    fn update(&mut self, statement: &Statement, parameter: &Value) -> StrataResult<u64>;

    /// Commit the session's transaction.
    fn commit(&mut self, required: bool) -> StrataResult<()>;

    /// Roll back the session's transaction.
    fn rollback(&mut self, required: bool) -> StrataResult<()>;

    /// Close the session, committing or rolling back buffered state first.
    fn close(&mut self, force_rollback: bool) -> StrataResult<()>;

    fn is_closed(&self) -> bool;

    /// Compute the composite cache key for one execution.
    fn create_cache_key(
        &self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        bound_sql: &BoundSql,
    ) -> CacheKey;

    /// Drop the session's first-level cache.
    fn clear_local_cache(&mut self);
}

/// Seam to the external SQL engine.
///
/// The engine that actually runs statements (connections, drivers, row
/// mapping) is a collaborator outside this crate; executors talk to it
/// through this trait only.
pub trait StatementRunner: Send {
    fn run_query(
        &mut self,
        statement: &Statement,
        bound_sql: &BoundSql,
        parameter: &Value,
    ) -> StrataResult<Vec<Row>>;

    fn run_update(
        &mut self,
        statement: &Statement,
        bound_sql: &BoundSql,
        parameter: &Value,
    ) -> StrataResult<u64>;

    fn commit(&mut self) -> StrataResult<()>;

    fn rollback(&mut self) -> StrataResult<()>;

    fn close(&mut self) -> StrataResult<()>;
}
