//! Statements with positional placeholders.

use bindery_core::{KeyGenerator, Parameter, Result};

use super::{parameter, HandlerBase, StatementHandler};
use crate::driver::{Connection, Statement};

/// Compiles the SQL once and binds inputs positionally.
pub(crate) struct PreparedStatementHandler {
    pub(crate) base: HandlerBase,
}

impl StatementHandler for PreparedStatementHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    fn instantiate(&self, connection: &mut dyn Connection) -> Result<Box<dyn Statement>> {
        let return_keys = matches!(self.base.command.key_generator(), KeyGenerator::Generated { .. });
        connection.prepare_statement(&self.base.bound_sql.sql, return_keys)
    }

    fn parameterize(&self, statement: &mut dyn Statement, parameter: &Parameter) -> Result<()> {
        parameter::set_parameters(statement, &self.base.bound_sql, parameter)
    }

    fn batch(&self, statement: &mut dyn Statement) -> Result<()> {
        statement.add_batch(None)
    }

    fn execute(&self, statement: &mut dyn Statement) -> Result<bool> {
        statement.execute(None)
    }
}
