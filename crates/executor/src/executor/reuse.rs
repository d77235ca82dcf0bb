//! Statements cached by SQL text.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use bindery_core::{MappedCommand, Parameter, Result, RowBounds, RowHandler, Value};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::ExecContext;
use crate::cursor::Cursor;
use crate::driver::Statement;
use crate::statement::{close_quietly, RoutingStatementHandler};

/// Keeps one open statement per distinct SQL text until the next flush,
/// commit, rollback or close.
#[derive(Default)]
pub(crate) struct ReuseExecutor {
    statements: FxHashMap<String, Box<dyn Statement>>,
}

impl ReuseExecutor {
    pub(crate) fn do_update(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
    ) -> Result<i64> {
        let handler = ctx.update_handler(command, parameter)?;
        let statement = self.prepare(ctx, &handler, parameter)?;
        handler.update(statement, parameter, ctx)
    }

    pub(crate) fn do_query(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
        bounds: RowBounds,
        row_handler: Option<&mut dyn RowHandler>,
    ) -> Result<Vec<Value>> {
        let handler = RoutingStatementHandler::new(&ctx.config, command, parameter, bounds)?;
        let statement = self.prepare(ctx, &handler, parameter)?;
        handler.query(statement, parameter, row_handler)
    }

    /// A cursor owns its statement until it is dropped, so it never takes
    /// one from the cache.
    pub(crate) fn do_query_cursor(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Cursor> {
        let handler = RoutingStatementHandler::new(&ctx.config, command, parameter, bounds)?;
        let statement = ctx.fresh_statement(&handler, parameter)?;
        handler.query_cursor(statement)
    }

    /// Close every cached statement
    pub(crate) fn do_flush(&mut self) {
        for (_, mut statement) in self.statements.drain() {
            close_quietly(statement.as_mut());
        }
    }

    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.statements.len()
    }

    fn prepare<'a>(
        &'a mut self,
        ctx: &mut ExecContext,
        handler: &RoutingStatementHandler,
        parameter: &Parameter,
    ) -> Result<&'a mut dyn Statement> {
        let sql = handler.bound_sql().sql.clone();
        if self.statements.get(&sql).is_some_and(|s| s.is_closed()) {
            self.statements.remove(&sql);
        }
        let timeout = ctx.transaction.timeout();
        let statement = match self.statements.entry(sql) {
            Entry::Occupied(entry) => {
                debug!(target: "bindery::executor", sql = %entry.key(), "Reusing statement");
                let statement = entry.into_mut();
                handler.apply_settings(statement.as_mut(), timeout)?;
                statement
            }
            Entry::Vacant(entry) => {
                let connection = ctx.transaction.connection()?;
                entry.insert(handler.prepare(connection, timeout)?)
            }
        };
        handler.parameterize(statement.as_mut(), parameter)?;
        Ok(statement.as_mut())
    }
}
