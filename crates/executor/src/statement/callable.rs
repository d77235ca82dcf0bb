//! Stored-procedure calls.

use bindery_core::{Parameter, Result};

use super::{parameter, HandlerBase, StatementHandler};
use crate::driver::{Connection, Statement};

/// Binds inputs, registers OUT parameters and reads them back after
/// execution.
pub(crate) struct CallableStatementHandler {
    pub(crate) base: HandlerBase,
}

impl StatementHandler for CallableStatementHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    fn instantiate(&self, connection: &mut dyn Connection) -> Result<Box<dyn Statement>> {
        connection.prepare_call(&self.base.bound_sql.sql)
    }

    fn parameterize(&self, statement: &mut dyn Statement, parameter: &Parameter) -> Result<()> {
        parameter::register_out_parameters(statement, &self.base.bound_sql)?;
        parameter::set_parameters(statement, &self.base.bound_sql, parameter)
    }

    fn batch(&self, statement: &mut dyn Statement) -> Result<()> {
        statement.add_batch(None)
    }

    fn execute(&self, statement: &mut dyn Statement) -> Result<bool> {
        statement.execute(None)
    }

    fn handle_outputs(&self, statement: &mut dyn Statement, parameter: &mut Parameter) -> Result<()> {
        parameter::handle_output_parameters(statement, &self.base.bound_sql, parameter)
    }
}
