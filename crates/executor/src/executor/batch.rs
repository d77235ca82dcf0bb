//! Queued mutations, sent on flush.
//!
//! Consecutive updates with the same command and SQL text share one driver
//! statement and add one batch entry each. Any other update opens a new
//! statement. Nothing reaches the database until the queue is flushed,
//! explicitly or implicitly by a query, commit or close.

use std::sync::Arc;

use bindery_core::{BatchResult, Error, MappedCommand, Parameter, Result, RowBounds, RowHandler, Value};
use tracing::debug;

use super::{ExecContext, BATCH_UPDATE_RETURN_VALUE};
use crate::cursor::Cursor;
use crate::driver::Statement;
use crate::statement::{close_quietly, keygen, RoutingStatementHandler, StatementGuard};

struct BatchEntry {
    statement: Box<dyn Statement>,
    command: Arc<MappedCommand>,
    result: BatchResult,
}

#[derive(Default)]
pub(crate) struct BatchExecutor {
    entries: Vec<BatchEntry>,
}

impl BatchExecutor {
    pub(crate) fn do_update(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
    ) -> Result<i64> {
        let handler = ctx.update_handler(command, parameter)?;
        let sql = handler.bound_sql().sql.as_str();

        let reusable = self
            .entries
            .last_mut()
            .filter(|last| last.result.command_id == command.id() && last.result.sql == sql);
        match reusable {
            Some(last) => {
                handler.parameterize(last.statement.as_mut(), parameter)?;
                handler.batch(last.statement.as_mut())?;
                last.result.parameters.push(parameter.clone());
            }
            None => {
                let mut statement = StatementGuard::new(ctx.fresh_statement(&handler, parameter)?);
                handler.batch(&mut *statement)?;
                let mut result = BatchResult::new(command.id(), sql);
                result.parameters.push(parameter.clone());
                self.entries.push(BatchEntry {
                    statement: statement.into_inner(),
                    command: Arc::clone(command),
                    result,
                });
            }
        }
        Ok(BATCH_UPDATE_RETURN_VALUE)
    }

    /// Queries see every queued mutation: the queue is flushed first.
    pub(crate) fn do_query(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
        bounds: RowBounds,
        row_handler: Option<&mut dyn RowHandler>,
    ) -> Result<Vec<Value>> {
        self.do_flush(ctx, false)?;
        let handler = RoutingStatementHandler::new(&ctx.config, command, parameter, bounds)?;
        let mut statement = StatementGuard::new(ctx.fresh_statement(&handler, parameter)?);
        handler.query(&mut *statement, parameter, row_handler)
    }

    pub(crate) fn do_query_cursor(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Cursor> {
        self.do_flush(ctx, false)?;
        let handler = RoutingStatementHandler::new(&ctx.config, command, parameter, bounds)?;
        let statement = ctx.fresh_statement(&handler, parameter)?;
        handler.query_cursor(statement)
    }

    /// Execute the queued statements in submission order.
    ///
    /// On a rollback the queue is discarded unexecuted. Every statement is
    /// closed before this returns, whether or not the flush succeeded.
    pub(crate) fn do_flush(&mut self, ctx: &mut ExecContext, is_rollback: bool) -> Result<Vec<BatchResult>> {
        let entries = std::mem::take(&mut self.entries);
        if is_rollback {
            for mut entry in entries {
                close_quietly(entry.statement.as_mut());
            }
            return Ok(Vec::new());
        }

        debug!(target: "bindery::executor", statements = entries.len(), "Flushing batch");
        let pending: Vec<_> = entries
            .into_iter()
            .map(|entry| (StatementGuard::new(entry.statement), entry.command, entry.result))
            .collect();

        let mut results = Vec::with_capacity(pending.len());
        for (index, (mut statement, command, mut result)) in pending.into_iter().enumerate() {
            let outcome = statement.execute_batch().and_then(|counts| {
                result.update_counts = counts;
                keygen::process_batch(
                    &command,
                    &mut *statement,
                    &mut result.parameters,
                    &result.update_counts,
                    ctx,
                )
            });
            match outcome {
                Ok(()) => results.push(result),
                Err(Error::BatchUpdate { update_counts, reason }) => {
                    return Err(Error::PartialBatch {
                        statement_index: index,
                        command_id: result.command_id,
                        sql: result.sql,
                        update_counts,
                        successful: results,
                        reason,
                    });
                }
                Err(e) => {
                    return Err(Error::PartialBatch {
                        statement_index: index,
                        command_id: result.command_id,
                        sql: result.sql,
                        update_counts: result.update_counts,
                        successful: results,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(results)
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.entries.len()
    }
}
