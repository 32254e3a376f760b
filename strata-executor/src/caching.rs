//! Second-level cache decorator over any [`Executor`].

use serde_json::Value;
use strata_cache::TransactionalCacheManager;
use strata_core::{
    BoundSql, CacheKey, ConfigError, Row, RowBounds, Statement, StatementKind, StrataResult,
};

use crate::traits::{Executor, ResultHandler};

/// Wraps a delegate executor with namespace-scoped second-level caching.
///
/// Reads go through the transactional buffer so a session never observes its
/// own uncommitted writes in the shared cache; buffered entries publish on
/// `commit` and vanish on `rollback`. Statements without a configured cache
/// pass straight through to the delegate.
pub struct CachingExecutor<E: Executor> {
    delegate: E,
    manager: TransactionalCacheManager,
}

impl<E: Executor> CachingExecutor<E> {
    pub fn new(delegate: E) -> Self {
        Self {
            delegate,
            manager: TransactionalCacheManager::new(),
        }
    }

    pub fn delegate(&self) -> &E {
        &self.delegate
    }

    fn flush_cache_if_required(&mut self, statement: &Statement) {
        if let Some(cache) = &statement.cache {
            if statement.flush_cache_required {
                tracing::debug!(cache_id = cache.id(), "Flushing cache for statement");
                self.manager.clear(cache);
            }
        }
    }

    fn ensure_no_out_params(statement: &Statement) -> StrataResult<()> {
        if statement.kind == StatementKind::Callable && statement.declares_non_input_params() {
            return Err(ConfigError::CallableStatementNotCacheable {
                statement_id: statement.id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

impl<E: Executor> Executor for CachingExecutor<E> {
    fn query_with_key(
        &mut self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
        key: &CacheKey,
        bound_sql: &BoundSql,
    ) -> StrataResult<Vec<Row>> {
        if let Some(cache) = statement.cache.clone() {
            self.flush_cache_if_required(statement);
            if statement.use_cache && handler.is_none() {
                Self::ensure_no_out_params(statement)?;
                let buffered = self.manager.get(&cache, key)?;
                // Only a stored row list counts as a hit. A null placeholder
                // marks a key another session missed on; re-query and replace
                // it with real rows.
                if let Some(Value::Array(rows)) = buffered {
                    tracing::debug!(
                        cache_id = cache.id(),
                        statement_id = %statement.id,
                        "Second-level cache hit"
                    );
                    return Ok(rows);
                }
                let rows = self
                    .delegate
                    .query_with_key(statement, parameter, bounds, handler, key, bound_sql)?;
                self.manager
                    .put(&cache, key.clone(), Value::Array(rows.clone()));
                return Ok(rows);
            }
        }
        self.delegate
            .query_with_key(statement, parameter, bounds, handler, key, bound_sql)
    }

    fn update(&mut self, statement: &Statement, parameter: &Value) -> StrataResult<u64> {
        self.flush_cache_if_required(statement);
        self.delegate.update(statement, parameter)
    }

    fn commit(&mut self, required: bool) -> StrataResult<()> {
        self.delegate.commit(required)?;
        self.manager.commit_all()?;
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> StrataResult<()> {
        let result = self.delegate.rollback(required);
        if required {
            self.manager.rollback_all();
        }
        result
    }

    fn close(&mut self, force_rollback: bool) -> StrataResult<()> {
        if self.delegate.is_closed() {
            return Ok(());
        }
        let buffers: StrataResult<()> = if force_rollback {
            self.manager.rollback_all();
            Ok(())
        } else {
            self.manager.commit_all().map_err(Into::into)
        };
        // The underlying session is released whether or not the buffer
        // flush succeeded.
        let closed = self.delegate.close(force_rollback);
        buffers?;
        closed
    }

    fn is_closed(&self) -> bool {
        self.delegate.is_closed()
    }

    fn create_cache_key(
        &self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        bound_sql: &BoundSql,
    ) -> CacheKey {
        self.delegate
            .create_cache_key(statement, parameter, bounds, bound_sql)
    }

    fn clear_local_cache(&mut self) {
        self.delegate.clear_local_cache();
    }
}

// ============================================================================
// TESTS
// ============================================================================
