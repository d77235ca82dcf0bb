//! Driver boundary.
//!
//! The executor talks to a database only through these traits. A
//! [`Statement`] is an owned resource, independent of the borrow of its
//! [`Connection`], so an executor can cache it across calls or hand it to a
//! [`Cursor`](crate::Cursor).

use bindery_core::{Result, Row, Value};

/// Source of connections (pool, single file, in-memory database...)
pub trait DataSource: Send + Sync {
    /// Open (or check out) a connection
    fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// A live database connection
pub trait Connection: Send {
    /// Statement for literal SQL text; the text is supplied on execute
    fn create_statement(&mut self) -> Result<Box<dyn Statement>>;

    /// Statement with positional placeholders, compiled from `sql`
    fn prepare_statement(&mut self, sql: &str, return_generated_keys: bool) -> Result<Box<dyn Statement>>;

    /// Stored-procedure call
    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn Statement>>;

    /// Current auto-commit mode
    fn auto_commit(&self) -> Result<bool>;

    /// Switch auto-commit mode
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction
    fn rollback(&mut self) -> Result<()>;

    /// Release the connection
    fn close(&mut self) -> Result<()>;
}

/// A prepared (or plain) statement.
///
/// Parameter indexes are 1-based.
pub trait Statement: Send {
    /// Timeout for subsequent executions, in seconds
    fn set_query_timeout(&mut self, seconds: u32) -> Result<()>;

    /// Row fetch size hint
    fn set_fetch_size(&mut self, rows: u32) -> Result<()>;

    /// Bind an input value
    fn bind(&mut self, index: usize, value: &Value) -> Result<()>;

    /// Declare an OUT parameter
    fn register_out_parameter(&mut self, index: usize) -> Result<()>;

    /// Execute. Plain statements receive their text in `sql`; prepared and
    /// callable statements receive `None`. Returns `true` when the
    /// execution produced rows.
    fn execute(&mut self, sql: Option<&str>) -> Result<bool>;

    /// Affected-row count of the last execution, if it was a mutation
    fn update_count(&self) -> Option<i64>;

    /// Next row of the current result, in order
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// Keys generated by the last execution (or batch), one row per entry
    fn generated_keys(&mut self) -> Result<Vec<Row>>;

    /// Value of an OUT parameter after execution
    fn out_parameter(&mut self, index: usize) -> Result<Value>;

    /// Queue the current bindings (or the given literal text) as a batch entry
    fn add_batch(&mut self, sql: Option<&str>) -> Result<()>;

    /// Run every queued entry in order.
    ///
    /// Fails with [`Error::BatchUpdate`](bindery_core::Error::BatchUpdate)
    /// carrying the counts of the entries that ran before the failure.
    fn execute_batch(&mut self) -> Result<Vec<i64>>;

    /// Drop all bound values
    fn clear_parameters(&mut self) -> Result<()>;

    /// Release the statement; further use is an error
    fn close(&mut self) -> Result<()>;

    /// Whether `close` was called
    fn is_closed(&self) -> bool;
}
