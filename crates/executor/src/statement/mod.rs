//! Statement handlers.
//!
//! Each command runs through one [`RoutingStatementHandler`], chosen from
//! the command's [`StatementKind`]:
//!
//! | Kind | Handler | Driver call | Binding |
//! |------|---------|-------------|---------|
//! | `statement` | [`SimpleStatementHandler`] | `create_statement` | none, text sent on execute |
//! | `prepared` | [`PreparedStatementHandler`] | `prepare_statement` | positional inputs |
//! | `callable` | [`CallableStatementHandler`] | `prepare_call` | inputs + OUT registration |
//!
//! The handler owns the command, its [`BoundSql`] and the row window; the
//! executor owns the connection and the statement lifecycle.

mod callable;
mod guard;
pub(crate) mod keygen;
mod parameter;
mod prepared;
mod simple;

use std::sync::Arc;

use bindery_core::{
    BoundSql, Configuration, MappedCommand, Parameter, Result, RowBounds, RowHandler, StatementKind,
    Value,
};
use tracing::debug;

use crate::cursor::Cursor;
use crate::driver::{Connection, Statement};
use crate::result::ResultSetHandler;

pub(crate) use callable::CallableStatementHandler;
pub(crate) use guard::{close_quietly, StatementGuard};
pub(crate) use prepared::PreparedStatementHandler;
pub(crate) use simple::SimpleStatementHandler;

use keygen::KeyQuery;

/// State shared by every handler kind
pub(crate) struct HandlerBase {
    pub(crate) config: Arc<Configuration>,
    pub(crate) command: Arc<MappedCommand>,
    pub(crate) bound_sql: BoundSql,
    pub(crate) bounds: RowBounds,
}

impl HandlerBase {
    fn new(
        config: &Arc<Configuration>,
        command: &Arc<MappedCommand>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Self> {
        Ok(Self {
            config: Arc::clone(config),
            command: Arc::clone(command),
            bound_sql: command.sql_source().bound_sql(parameter)?,
            bounds,
        })
    }

    /// The smaller of the command (or default) timeout and the transaction's
    fn effective_timeout(&self, transaction_timeout: Option<u32>) -> Option<u32> {
        let own = self
            .command
            .timeout()
            .or(self.config.settings().default_statement_timeout);
        match (own, transaction_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn apply_settings(&self, statement: &mut dyn Statement, transaction_timeout: Option<u32>) -> Result<()> {
        if let Some(seconds) = self.effective_timeout(transaction_timeout) {
            statement.set_query_timeout(seconds)?;
        }
        let fetch_size = self
            .command
            .fetch_size()
            .or(self.config.settings().default_fetch_size);
        if let Some(rows) = fetch_size {
            statement.set_fetch_size(rows)?;
        }
        Ok(())
    }

    fn result_set_handler(&self) -> ResultSetHandler<'_> {
        ResultSetHandler {
            mapper: self.config.row_mapper().as_ref(),
            result_type: self.command.result_type(),
            bounds: self.bounds,
        }
    }
}

/// Kind-specific steps of running a statement.
pub(crate) trait StatementHandler {
    fn base(&self) -> &HandlerBase;

    /// Create the driver statement
    fn instantiate(&self, connection: &mut dyn Connection) -> Result<Box<dyn Statement>>;

    /// Bind the parameter object
    fn parameterize(&self, statement: &mut dyn Statement, parameter: &Parameter) -> Result<()>;

    /// Queue the current bindings as one batch entry
    fn batch(&self, statement: &mut dyn Statement) -> Result<()>;

    /// Run the statement
    fn execute(&self, statement: &mut dyn Statement) -> Result<bool>;

    /// Copy OUT parameters back after execution
    fn handle_outputs(&self, _statement: &mut dyn Statement, _parameter: &mut Parameter) -> Result<()> {
        Ok(())
    }
}

/// The handler for one command invocation, dispatched on statement kind.
pub(crate) enum RoutingStatementHandler {
    Simple(SimpleStatementHandler),
    Prepared(PreparedStatementHandler),
    Callable(CallableStatementHandler),
}

impl RoutingStatementHandler {
    pub(crate) fn new(
        config: &Arc<Configuration>,
        command: &Arc<MappedCommand>,
        parameter: &Parameter,
        bounds: RowBounds,
    ) -> Result<Self> {
        let base = HandlerBase::new(config, command, parameter, bounds)?;
        Ok(match command.statement_kind() {
            StatementKind::Statement => Self::Simple(SimpleStatementHandler { base }),
            StatementKind::Prepared => Self::Prepared(PreparedStatementHandler { base }),
            StatementKind::Callable => Self::Callable(CallableStatementHandler { base }),
        })
    }

    fn delegate(&self) -> &dyn StatementHandler {
        match self {
            Self::Simple(h) => h,
            Self::Prepared(h) => h,
            Self::Callable(h) => h,
        }
    }

    pub(crate) fn command(&self) -> &Arc<MappedCommand> {
        &self.delegate().base().command
    }

    pub(crate) fn bound_sql(&self) -> &BoundSql {
        &self.delegate().base().bound_sql
    }

    /// Create a statement with its timeout and fetch size applied.
    ///
    /// The statement is closed if applying the settings fails.
    pub(crate) fn prepare(
        &self,
        connection: &mut dyn Connection,
        transaction_timeout: Option<u32>,
    ) -> Result<Box<dyn Statement>> {
        let handler = self.delegate();
        debug!(target: "bindery::statement", command = handler.base().command.id(), sql = %handler.base().bound_sql.sql, "==> Preparing");
        let mut statement = StatementGuard::new(handler.instantiate(connection)?);
        handler.base().apply_settings(&mut *statement, transaction_timeout)?;
        Ok(statement.into_inner())
    }

    /// Apply this command's timeout and fetch size to a statement created
    /// for another invocation
    pub(crate) fn apply_settings(&self, statement: &mut dyn Statement, transaction_timeout: Option<u32>) -> Result<()> {
        self.delegate().base().apply_settings(statement, transaction_timeout)
    }

    pub(crate) fn parameterize(&self, statement: &mut dyn Statement, parameter: &Parameter) -> Result<()> {
        self.delegate().parameterize(statement, parameter)
    }

    pub(crate) fn batch(&self, statement: &mut dyn Statement) -> Result<()> {
        self.delegate().batch(statement)
    }

    /// Execute a mutation and return its affected-row count.
    ///
    /// Runs post-execution key generation, writing keys into `parameter`.
    pub(crate) fn update(
        &self,
        statement: &mut dyn Statement,
        parameter: &mut Parameter,
        keys: &mut dyn KeyQuery,
    ) -> Result<i64> {
        let handler = self.delegate();
        handler.execute(statement)?;
        let count = statement.update_count().unwrap_or(0);
        handler.handle_outputs(statement, parameter)?;
        keygen::process_after(&handler.base().command, statement, parameter, keys)?;
        debug!(target: "bindery::statement", updates = count, "<== Updates");
        Ok(count)
    }

    /// Execute a query and map its rows within the row window.
    pub(crate) fn query(
        &self,
        statement: &mut dyn Statement,
        parameter: &mut Parameter,
        row_handler: Option<&mut dyn RowHandler>,
    ) -> Result<Vec<Value>> {
        let handler = self.delegate();
        handler.execute(statement)?;
        let rows = handler.base().result_set_handler().handle_rows(statement, row_handler)?;
        handler.handle_outputs(statement, parameter)?;
        Ok(rows)
    }

    /// Execute a query and hand its statement to a lazy [`Cursor`]
    pub(crate) fn query_cursor(&self, statement: Box<dyn Statement>) -> Result<Cursor> {
        let handler = self.delegate();
        let base = handler.base();
        let mut statement = StatementGuard::new(statement);
        handler.execute(&mut *statement)?;
        Ok(Cursor::new(
            statement.into_inner(),
            Arc::clone(base.config.row_mapper()),
            base.command.result_type().map(str::to_string),
            base.bounds,
        ))
    }
}
