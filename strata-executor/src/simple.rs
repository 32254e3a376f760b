//! Base executor with the session-scoped first-level cache.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use strata_core::{
    BoundSql, CacheKey, ExecutorError, Row, RowBounds, Statement, StrataResult,
};
use uuid::Uuid;

use crate::traits::{Executor, ResultHandler, StatementRunner};

/// The query-executing delegate: runs statements through a
/// [`StatementRunner`] and keeps the session's first-level cache.
///
/// The first-level cache is a plain per-session map, consulted before the
/// runner and dropped on every write, commit, and rollback. Unlike the
/// second-level cache it has no transactional buffering; it never outlives
/// the transaction that filled it.
pub struct SimpleExecutor<R: StatementRunner> {
    runner: R,
    local_cache: HashMap<CacheKey, Vec<Row>>,
    closed: bool,
    session_id: Uuid,
    opened_at: DateTime<Utc>,
}

impl<R: StatementRunner> SimpleExecutor<R> {
    pub fn new(runner: R) -> Self {
        let session_id = Uuid::now_v7();
        tracing::debug!(%session_id, "Opened executor session");
        Self {
            runner,
            local_cache: HashMap::new(),
            closed: false,
            session_id,
            opened_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn ensure_open(&self) -> StrataResult<()> {
        if self.closed {
            return Err(ExecutorError::AlreadyClosed.into());
        }
        Ok(())
    }

    fn run_bounded(
        &mut self,
        statement: &Statement,
        bound_sql: &BoundSql,
        parameter: &Value,
        bounds: RowBounds,
    ) -> StrataResult<Vec<Row>> {
        let rows = self.runner.run_query(statement, bound_sql, parameter)?;
        Ok(rows
            .into_iter()
            .skip(bounds.offset)
            .take(bounds.limit)
            .collect())
    }
}

impl<R: StatementRunner> Executor for SimpleExecutor<R> {
    fn query_with_key(
        &mut self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        handler: Option<&mut dyn ResultHandler>,
        key: &CacheKey,
        bound_sql: &BoundSql,
    ) -> StrataResult<Vec<Row>> {
        self.ensure_open()?;

        // Streamed results never touch the local cache.
        if let Some(handler) = handler {
            let rows = self.run_bounded(statement, bound_sql, parameter, bounds)?;
            for row in &rows {
                handler.handle(row);
            }
            return Ok(rows);
        }

        if let Some(rows) = self.local_cache.get(key) {
            tracing::debug!(
                session_id = %self.session_id,
                statement_id = %statement.id,
                "First-level cache hit"
            );
            return Ok(rows.clone());
        }

        let rows = self.run_bounded(statement, bound_sql, parameter, bounds)?;
        self.local_cache.insert(key.clone(), rows.clone());
        Ok(rows)
    }

    fn update(&mut self, statement: &Statement, parameter: &Value) -> StrataResult<u64> {
        self.ensure_open()?;
        // Any write invalidates the whole first-level cache.
        self.local_cache.clear();
        let bound_sql = statement.bound_sql(parameter);
        self.runner.run_update(statement, &bound_sql, parameter)
    }

    fn commit(&mut self, required: bool) -> StrataResult<()> {
        self.ensure_open()?;
        self.local_cache.clear();
        if required {
            self.runner.commit()?;
        }
        Ok(())
    }

    fn rollback(&mut self, required: bool) -> StrataResult<()> {
        self.ensure_open()?;
        self.local_cache.clear();
        if required {
            self.runner.rollback()?;
        }
        Ok(())
    }

    fn close(&mut self, force_rollback: bool) -> StrataResult<()> {
        if self.closed {
            return Ok(());
        }
        if force_rollback {
            if let Err(error) = self.rollback(true) {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %error,
                    "Rollback on close failed"
                );
            }
        }
        let result = self.runner.close();
        self.closed = true;
        self.local_cache.clear();
        tracing::info!(
            session_id = %self.session_id,
            session_secs = (Utc::now() - self.opened_at).num_seconds(),
            "Closed executor session"
        );
        result
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn create_cache_key(
        &self,
        statement: &Statement,
        parameter: &Value,
        bounds: RowBounds,
        bound_sql: &BoundSql,
    ) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(&json!(statement.id));
        key.update(&json!(bounds.offset));
        key.update(&json!(bounds.limit));
        key.update(&json!(bound_sql.sql));
        key.update(parameter);
        key
    }

    fn clear_local_cache(&mut self) {
        if !self.closed {
            self.local_cache.clear();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
