//! One statement per call.

use std::sync::Arc;

use bindery_core::{MappedCommand, Parameter, Result, RowBounds, RowHandler, Value};

use super::ExecContext;
use crate::cursor::Cursor;
use crate::statement::{RoutingStatementHandler, StatementGuard};

/// Prepares a fresh statement for every call and closes it afterwards.
#[derive(Debug, Default)]
pub(crate) struct SimpleExecutor;

impl SimpleExecutor {
    pub(crate) fn do_update(
        &mut self,
        ctx: &mut ExecContext,
        command: &Arc<MappedCommand>,
        parameter: &mut Parameter,
    ) -> Result<i64> {
        let handler = ctx.update_handler(command, parameter)?;
        let mut statement = StatementGuard::new(ctx.fresh_statement(&handler, parameter)?);
        handler.update(&mut *statement, parameter, ctx)
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
        let handler = RoutingStatementHandler::new(&ctx.config, command, parameter, bounds)?;
        let statement = ctx.fresh_statement(&handler, parameter)?;
        handler.query_cursor(statement)
    }
}
