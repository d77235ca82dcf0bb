//! Sessions: the command-level API over one executor.
//!
//! A [`SqlSession`] runs registered commands by id. [`DefaultSession`]
//! resolves the id in the shared [`Configuration`], wraps a lone array
//! parameter under `list`/`collection`, and tracks whether it has
//! uncommitted mutations.
//!
//! # Usage
//!
//! ```ignore
//! let mut session = factory.open_session()?;
//! let mut param = Parameter::from(Value::from("u1"));
//! let user = session.select_one("UserMapper.findById", &mut param)?;
//! session.update("UserMapper.touch", &mut param)?;
//! session.commit(false)?;
//! ```

use std::sync::Arc;

use bindery_core::{
    BatchResult, Configuration, Error, MappedCommand, Parameter, Result, ResultContext, ResultMap,
    RowBounds, RowHandler, Value,
};

use crate::cursor::Cursor;
use crate::executor::Executor;
use crate::result::MapResultHandler;

/// Command-level database session.
///
/// A session is not safe for concurrent use: callers run one command at a
/// time, or use one session per thread.
pub trait SqlSession {
    /// At most one row.
    ///
    /// # Errors
    ///
    /// [`Error::TooManyResults`] when more than one row comes back.
    fn select_one(&mut self, id: &str, parameter: &mut Parameter) -> Result<Option<Value>>;

    /// Every row within `bounds`
    fn select_list(&mut self, id: &str, parameter: &mut Parameter, bounds: RowBounds) -> Result<Vec<Value>>;

    /// Rows keyed by their `map_key` property
    fn select_map(
        &mut self,
        id: &str,
        parameter: &mut Parameter,
        map_key: &str,
        bounds: RowBounds,
    ) -> Result<ResultMap>;

    /// Rows read lazily. The cursor keeps its statement open until it is
    /// exhausted, closed or dropped.
    fn select_cursor(&mut self, id: &str, parameter: &mut Parameter, bounds: RowBounds) -> Result<Cursor>;

    /// Every row handed to `handler` instead of being collected
    fn select_with_handler(
        &mut self,
        id: &str,
        parameter: &mut Parameter,
        bounds: RowBounds,
        handler: &mut dyn RowHandler,
    ) -> Result<()>;

    /// Affected-row count of an INSERT
    fn insert(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64>;

    /// Affected-row count of an UPDATE
    fn update(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64>;

    /// Affected-row count of a DELETE
    fn delete(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64>;

    /// Send queued batch statements
    fn flush_statements(&mut self) -> Result<Vec<BatchResult>>;

    /// Commit; `force` commits even without pending changes
    fn commit(&mut self, force: bool) -> Result<()>;

    /// Roll back; `force` rolls back even without pending changes
    fn rollback(&mut self, force: bool) -> Result<()>;

    /// Close, rolling back uncommitted changes
    fn close(&mut self);

    /// Drop the local query cache
    fn clear_cache(&mut self);

    /// The configuration this session runs against
    fn configuration(&self) -> &Configuration;
}

/// Session over an [`Executor`].
pub struct DefaultSession {
    config: Arc<Configuration>,
    executor: Executor,
    auto_commit: bool,
    dirty: bool,
}

impl DefaultSession {
    /// Wrap `executor`
    pub fn new(config: Arc<Configuration>, executor: Executor, auto_commit: bool) -> Self {
        Self {
            config,
            executor,
            auto_commit,
            dirty: false,
        }
    }

    /// Whether mutations ran since the last commit or rollback
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The underlying executor
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    fn command(&self, id: &str) -> Result<Arc<MappedCommand>> {
        self.config.registry().get(id).cloned()
    }

    fn commit_or_rollback_required(&self, force: bool) -> bool {
        (!self.auto_commit && self.dirty) || force
    }

    fn mutate(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64> {
        let command = self.command(id)?;
        self.dirty = true;
        let executor = &mut self.executor;
        with_wrapped(parameter, |p| executor.update(&command, p))
    }

    fn query(
        &mut self,
        id: &str,
        parameter: &mut Parameter,
        bounds: RowBounds,
        handler: Option<&mut dyn RowHandler>,
    ) -> Result<Vec<Value>> {
        let command = self.command(id)?;
        let executor = &mut self.executor;
        with_wrapped(parameter, |p| executor.query(&command, p, bounds, handler))
    }
}

/// Run `f` on the parameter, with a lone array wrapped under `list` and
/// `collection`. The wrapper is discarded afterwards.
fn with_wrapped<T>(parameter: &mut Parameter, f: impl FnOnce(&mut Parameter) -> Result<T>) -> Result<T> {
    if matches!(parameter, Parameter::Single(Value::Array(_))) {
        let mut wrapped = parameter.clone().wrap_collection();
        f(&mut wrapped)
    } else {
        f(parameter)
    }
}

impl SqlSession for DefaultSession {
    fn select_one(&mut self, id: &str, parameter: &mut Parameter) -> Result<Option<Value>> {
        let mut rows = self.query(id, parameter, RowBounds::DEFAULT, None)?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            found => Err(Error::TooManyResults { found }),
        }
    }

    fn select_list(&mut self, id: &str, parameter: &mut Parameter, bounds: RowBounds) -> Result<Vec<Value>> {
        self.query(id, parameter, bounds, None)
    }

    fn select_map(
        &mut self,
        id: &str,
        parameter: &mut Parameter,
        map_key: &str,
        bounds: RowBounds,
    ) -> Result<ResultMap> {
        let rows = self.query(id, parameter, bounds, None)?;
        let mut handler = MapResultHandler::new(map_key);
        let mut context = ResultContext::new();
        for row in rows {
            context.next_result(row);
            handler.handle_result(&mut context);
            if context.is_stopped() {
                break;
            }
        }
        handler.finish()
    }

    fn select_cursor(&mut self, id: &str, parameter: &mut Parameter, bounds: RowBounds) -> Result<Cursor> {
        let command = self.command(id)?;
        let executor = &mut self.executor;
        with_wrapped(parameter, |p| executor.query_cursor(&command, p, bounds))
    }

    fn select_with_handler(
        &mut self,
        id: &str,
        parameter: &mut Parameter,
        bounds: RowBounds,
        handler: &mut dyn RowHandler,
    ) -> Result<()> {
        self.query(id, parameter, bounds, Some(handler)).map(|_| ())
    }

    fn insert(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64> {
        self.mutate(id, parameter)
    }

    fn update(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64> {
        self.mutate(id, parameter)
    }

    fn delete(&mut self, id: &str, parameter: &mut Parameter) -> Result<i64> {
        self.mutate(id, parameter)
    }

    fn flush_statements(&mut self) -> Result<Vec<BatchResult>> {
        self.executor.flush_statements()
    }

    fn commit(&mut self, force: bool) -> Result<()> {
        let required = self.commit_or_rollback_required(force);
        self.executor.commit(required)?;
        self.dirty = false;
        Ok(())
    }

    fn rollback(&mut self, force: bool) -> Result<()> {
        let required = self.commit_or_rollback_required(force);
        self.executor.rollback(required)?;
        self.dirty = false;
        Ok(())
    }

    fn close(&mut self) {
        let required = self.commit_or_rollback_required(false);
        self.executor.close(required);
        self.dirty = false;
    }

    fn clear_cache(&mut self) {
        self.executor.clear_local_cache();
    }

    fn configuration(&self) -> &Configuration {
        &self.config
    }
}

impl Drop for DefaultSession {
    fn drop(&mut self) {
        self.close();
    }
}
