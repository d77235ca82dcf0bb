//! Literal-text statements.

use bindery_core::{Parameter, Result};

use super::{HandlerBase, StatementHandler};
use crate::driver::{Connection, Statement};

/// Runs the command's SQL text as-is; nothing is bound.
pub(crate) struct SimpleStatementHandler {
    pub(crate) base: HandlerBase,
}

impl StatementHandler for SimpleStatementHandler {
    fn base(&self) -> &HandlerBase {
        &self.base
    }

    fn instantiate(&self, connection: &mut dyn Connection) -> Result<Box<dyn Statement>> {
        connection.create_statement()
    }

    fn parameterize(&self, _statement: &mut dyn Statement, _parameter: &Parameter) -> Result<()> {
        Ok(())
    }

    fn batch(&self, statement: &mut dyn Statement) -> Result<()> {
        statement.add_batch(Some(&self.base.bound_sql.sql))
    }

    fn execute(&self, statement: &mut dyn Statement) -> Result<bool> {
        statement.execute(Some(&self.base.bound_sql.sql))
    }
}
