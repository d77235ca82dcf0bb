//! Executors: how statements are issued over a session's transaction.
//!
//! An [`Executor`] owns the transaction, the local query cache and one
//! statement strategy:
//!
//! | [`ExecutorType`] | Strategy |
//! |------------------|----------|
//! | `Simple` | fresh statement per call, closed right away |
//! | `Reuse` | statements cached by SQL text until flush/commit/rollback/close |
//! | `Batch` | mutations queued, executed on flush; queries flush first |
//!
//! The common layer clears the local cache before every mutation, on
//! commit and on rollback, and refuses every call once closed.

mod batch;
mod cache;
mod reuse;
mod simple;

use std::sync::Arc;

use bindery_core::{
    BatchResult, Configuration, Error, ExecutorType, LocalCacheScope, MappedCommand, Parameter,
    Result, RowBounds, RowHandler, StatementKind, Value,
};
use tracing::{debug, warn};

use crate::cursor::Cursor;
use crate::driver::Statement;
use crate::statement::keygen::{self, KeyQuery};
use crate::statement::{RoutingStatementHandler, StatementGuard};
use crate::transaction::Transaction;

use batch::BatchExecutor;
use cache::{CacheKey, LocalCache};
use reuse::ReuseExecutor;
use simple::SimpleExecutor;

/// What a batch executor returns for each queued mutation in place of an
/// affected-row count.
pub const BATCH_UPDATE_RETURN_VALUE: i64 = i32::MIN as i64 + 1002;

/// Configuration and transaction shared by every strategy
pub(crate) struct ExecContext {
    pub(crate) config: Arc<Configuration>,
    pub(crate) transaction: Box<dyn Transaction>,
}

impl ExecContext {
    /// Handler for a mutation, after any key query meant to precede it
    pub(crate) fn update_handler(
        &mut self,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
    ) -> Result<RoutingStatementHandler> {
        keygen::process_before(command, parameter, self)?;
        RoutingStatementHandler::new(&self.config, command, parameter, RowBounds::DEFAULT)
    }

    /// A newly prepared and bound statement.
    ///
    /// The statement is closed if binding fails.
    pub(crate) fn fresh_statement(
        &mut self,
        handler: &RoutingStatementHandler,
        parameter: &Parameter,
    ) -> Result<Box<dyn Statement>> {
        let timeout = self.transaction.timeout();
        let connection = self.transaction.connection()?;
        let mut statement = StatementGuard::new(handler.prepare(connection, timeout)?);
        handler.parameterize(&mut *statement, parameter)?;
        Ok(statement.into_inner())
    }
}

impl KeyQuery for ExecContext {
    fn select_key(&mut self, command_id: &str, parameter: &Parameter) -> Result<Vec<Value>> {
        let command = Arc::clone(self.config.registry().get(command_id)?);
        let handler = RoutingStatementHandler::new(&self.config, &command, parameter, RowBounds::DEFAULT)?;
        let mut statement = StatementGuard::new(self.fresh_statement(&handler, parameter)?);
        let mut scratch = parameter.clone();
        handler.query(&mut *statement, &mut scratch, None)
    }
}

enum Strategy {
    Simple(SimpleExecutor),
    Reuse(ReuseExecutor),
    Batch(BatchExecutor),
}

/// Issues commands over one transaction.
pub struct Executor {
    ctx: ExecContext,
    strategy: Strategy,
    local_cache: LocalCache,
    closed: bool,
}

impl Executor {
    /// Create an executor of the given type over `transaction`
    pub fn new(config: Arc<Configuration>, transaction: Box<dyn Transaction>, executor_type: ExecutorType) -> Self {
        let strategy = match executor_type {
            ExecutorType::Simple => Strategy::Simple(SimpleExecutor),
            ExecutorType::Reuse => Strategy::Reuse(ReuseExecutor::default()),
            ExecutorType::Batch => Strategy::Batch(BatchExecutor::default()),
        };
        Self {
            ctx: ExecContext { config, transaction },
            strategy,
            local_cache: LocalCache::default(),
            closed: false,
        }
    }

    /// The strategy this executor runs
    pub fn executor_type(&self) -> ExecutorType {
        match self.strategy {
            Strategy::Simple(_) => ExecutorType::Simple,
            Strategy::Reuse(_) => ExecutorType::Reuse,
            Strategy::Batch(_) => ExecutorType::Batch,
        }
    }

    /// The shared configuration
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.ctx.config
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::executor("executor was closed"));
        }
        Ok(())
    }

    /// Run a mutation.
    ///
    /// Returns the affected-row count, or [`BATCH_UPDATE_RETURN_VALUE`] on
    /// a batch executor. Keys and OUT parameters are written into
    /// `parameter`.
    pub fn update(&mut self, command: &Arc<MappedCommand>, parameter: &mut Parameter) -> Result<i64> {
        self.ensure_open()?;
        self.local_cache.clear();
        let ctx = &mut self.ctx;
        match &mut self.strategy {
            Strategy::Simple(s) => s.do_update(ctx, command, parameter),
            Strategy::Reuse(s) => s.do_update(ctx, command, parameter),
            Strategy::Batch(s) => s.do_update(ctx, command, parameter),
        }
    }

    /// Run a query.
    ///
    /// Without a row handler the mapped rows are returned and cached for
    /// the session; with one, every row goes to the handler and the
    /// returned list is empty. Callable commands are never cached since
    /// their OUT parameters must be read on every call.
    pub fn query(
        &mut self,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
        bounds: RowBounds,
        row_handler: Option<&mut dyn RowHandler>,
    ) -> Result<Vec<Value>> {
        self.ensure_open()?;
        if command.flush_cache() {
            self.local_cache.clear();
        }

        let cacheable = row_handler.is_none() && command.statement_kind() != StatementKind::Callable;
        let key = if cacheable {
            let bound_sql = command.sql_source().bound_sql(parameter)?;
            let key = CacheKey::new(command, bounds, &bound_sql, parameter)?;
            if let Some(rows) = self.local_cache.get(&key) {
                debug!(target: "bindery::executor", command = command.id(), "Local cache hit");
                return Ok(rows.clone());
            }
            Some(key)
        } else {
            None
        };

        let ctx = &mut self.ctx;
        let rows = match &mut self.strategy {
            Strategy::Simple(s) => s.do_query(ctx, command, parameter, bounds, row_handler),
            Strategy::Reuse(s) => s.do_query(ctx, command, parameter, bounds, row_handler),
            Strategy::Batch(s) => s.do_query(ctx, command, parameter, bounds, row_handler),
        }?;

        if let Some(key) = key {
            self.local_cache.put(key, rows.clone());
        }
        if self.ctx.config.settings().local_cache_scope == LocalCacheScope::Statement {
            self.local_cache.clear();
        }
        Ok(rows)
    }

    /// Run a query whose rows are read lazily through a [`Cursor`]
    pub fn query_cursor(
        &mut self,
        command: &Arc<MappedCommand>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Cursor> {
        self.ensure_open()?;
        if command.flush_cache() {
            self.local_cache.clear();
        }
        let ctx = &mut self.ctx;
        match &mut self.strategy {
            Strategy::Simple(s) => s.do_query_cursor(ctx, command, parameter, bounds),
            Strategy::Reuse(s) => s.do_query_cursor(ctx, command, parameter, bounds),
            Strategy::Batch(s) => s.do_query_cursor(ctx, command, parameter, bounds),
        }
    }

    /// Send queued work. Only a batch executor returns results.
    pub fn flush_statements(&mut self) -> Result<Vec<BatchResult>> {
        self.ensure_open()?;
        self.do_flush(false)
    }

    fn do_flush(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>> {
        let ctx = &mut self.ctx;
        match &mut self.strategy {
            Strategy::Simple(_) => Ok(Vec::new()),
            Strategy::Reuse(s) => {
                s.do_flush();
                Ok(Vec::new())
            }
            Strategy::Batch(s) => s.do_flush(ctx, is_rollback),
        }
    }

    /// Flush queued work, then commit the transaction if `required`
    pub fn commit(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Err(Error::executor("cannot commit, transaction is already closed"));
        }
        self.local_cache.clear();
        self.do_flush(false)?;
        if required {
            self.ctx.transaction.commit()?;
        }
        Ok(())
    }

    /// Discard queued work, then roll back the transaction if `required`
    pub fn rollback(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.local_cache.clear();
        let flushed = self.do_flush(true);
        if required {
            self.ctx.transaction.rollback()?;
        }
        flushed.map(|_| ())
    }

    /// Drop the local cache
    pub fn clear_local_cache(&mut self) {
        if !self.closed {
            self.local_cache.clear();
        }
    }

    /// Roll back (when `force_rollback`), release statements and close the
    /// transaction. Failures are logged, never returned.
    pub fn close(&mut self, force_rollback: bool) {
        if self.closed {
            return;
        }
        if let Err(e) = self.rollback(force_rollback) {
            warn!(target: "bindery::executor", error = %e, "Unexpected exception on closing transaction");
        }
        if let Err(e) = self.ctx.transaction.close() {
            warn!(target: "bindery::executor", error = %e, "Unexpected exception on closing transaction");
        }
        self.local_cache.clear();
        self.closed = true;
    }

    #[cfg(test)]
    pub(crate) fn cached_queries(&self) -> usize {
        self.local_cache.len()
    }

    #[cfg(test)]
    pub(crate) fn open_statement_count(&self) -> usize {
        match &self.strategy {
            Strategy::Simple(_) => 0,
            Strategy::Reuse(s) => s.cached(),
            Strategy::Batch(s) => s.queued(),
        }
    }
}
