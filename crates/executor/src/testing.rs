//! Scripted in-memory driver.
//!
//! [`ScriptedDataSource`] answers SQL text with canned [`Response`]s and
//! records every driver call as an [`Event`], so tests can assert exactly
//! what reached the "database": which statements were prepared, what was
//! bound, when statements were closed, and when the transaction committed.
//!
//! ```ignore
//! let driver = ScriptedDataSource::new();
//! driver.respond("SELECT * FROM users", Response::rows(&["id"], vec![vec![Value::Int(1)]]));
//! let factory = SessionFactory::new(config, Arc::new(driver.clone()));
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use bindery_core::{Error, Result, Row, Value};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::driver::{Connection, DataSource, Statement};

/// How a statement was created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Plain,
    Prepared,
    Callable,
}

/// One recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    AutoCommit(bool),
    Prepared { sql: String, kind: StatementType },
    Timeout(u32),
    FetchSize(u32),
    Bound { index: usize, value: Value },
    OutRegistered { index: usize },
    Executed { sql: String },
    BatchAdded { sql: String },
    BatchExecuted { sql: String, entries: usize },
    StatementClosed { sql: String },
    Committed,
    RolledBack,
    ConnectionClosed,
}

/// Canned answer for one SQL text.
#[derive(Debug, Clone, Default)]
pub struct Response {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    update_count: Option<i64>,
    generated_keys: Vec<Row>,
    out_values: Vec<(usize, Value)>,
    error: Option<String>,
    prepare_error: Option<String>,
    batch_failure: Option<(usize, String)>,
    read_failure: Option<(usize, String)>,
}

impl Response {
    /// A result set
    pub fn rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            ..Self::default()
        }
    }

    /// A mutation affecting `count` rows (per batch entry when batched)
    pub fn update_count(count: i64) -> Self {
        Self {
            update_count: Some(count),
            ..Self::default()
        }
    }

    /// Execution fails with a statement error
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Preparing the statement fails
    pub fn prepare_error(reason: impl Into<String>) -> Self {
        Self {
            prepare_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// One generated-key row per execution (or per batch entry)
    pub fn with_generated_keys(mut self, column: &str, keys: Vec<Value>) -> Self {
        self.generated_keys = keys
            .into_iter()
            .map(|key| Row::new(vec![column.to_string()], vec![key]))
            .collect();
        self
    }

    /// Value of the OUT parameter at `index` (1-based)
    pub fn with_out(mut self, index: usize, value: Value) -> Self {
        self.out_values.push((index, value));
        self
    }

    /// Batch entry `entry` (0-based) fails; earlier entries succeed
    pub fn with_batch_failure(mut self, entry: usize, reason: impl Into<String>) -> Self {
        self.batch_failure = Some((entry, reason.into()));
        self
    }

    /// Reading fails once `rows` rows have been read
    pub fn with_read_failure(mut self, rows: usize, reason: impl Into<String>) -> Self {
        self.read_failure = Some((rows, reason.into()));
        self
    }
}

#[derive(Default)]
struct ScriptState {
    responses: FxHashMap<String, Response>,
    events: Vec<Event>,
    open_statements: usize,
}

impl ScriptState {
    fn response(&self, sql: &str) -> Response {
        self.responses.get(sql.trim()).cloned().unwrap_or_default()
    }
}

/// Data source whose connections answer from a script.
///
/// Clones share the script and the event log.
#[derive(Clone, Default)]
pub struct ScriptedDataSource {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedDataSource {
    /// Empty script: unknown SQL returns no rows and no update count
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `sql` with `response`
    pub fn respond(&self, sql: &str, response: Response) {
        self.state.lock().responses.insert(sql.trim().to_string(), response);
    }

    /// Every event so far, in order
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    /// Forget recorded events
    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    /// Statements created but not yet closed
    pub fn open_statements(&self) -> usize {
        self.state.lock().open_statements
    }

    /// A connection that is not tied to a session, for
    /// `open_session_with_connection`
    pub fn connection(&self, auto_commit: bool) -> Box<dyn Connection> {
        self.record(Event::Connected);
        Box::new(ScriptedConnection {
            state: Arc::clone(&self.state),
            auto_commit,
        })
    }

    fn record(&self, event: Event) {
        self.state.lock().events.push(event);
    }
}

impl DataSource for ScriptedDataSource {
    fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(self.connection(true))
    }
}

struct ScriptedConnection {
    state: Arc<Mutex<ScriptState>>,
    auto_commit: bool,
}

impl ScriptedConnection {
    fn open(&mut self, sql: &str, kind: StatementType) -> Result<Box<dyn Statement>> {
        let mut state = self.state.lock();
        if let Some(reason) = state.response(sql).prepare_error {
            return Err(Error::statement(reason));
        }
        state.events.push(Event::Prepared {
            sql: sql.to_string(),
            kind,
        });
        state.open_statements += 1;
        Ok(Box::new(ScriptedStatement {
            state: Arc::clone(&self.state),
            sql: sql.to_string(),
            rows: VecDeque::new(),
            rows_read: 0,
            read_failure: None,
            update_count: None,
            generated_keys: Vec::new(),
            out_values: Vec::new(),
            batch: Vec::new(),
            closed: false,
        }))
    }
}

impl Connection for ScriptedConnection {
    fn create_statement(&mut self) -> Result<Box<dyn Statement>> {
        self.open("", StatementType::Plain)
    }

    fn prepare_statement(&mut self, sql: &str, _return_generated_keys: bool) -> Result<Box<dyn Statement>> {
        self.open(sql, StatementType::Prepared)
    }

    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn Statement>> {
        self.open(sql, StatementType::Callable)
    }

    fn auto_commit(&self) -> Result<bool> {
        Ok(self.auto_commit)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.auto_commit = auto_commit;
        self.state.lock().events.push(Event::AutoCommit(auto_commit));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.state.lock().events.push(Event::Committed);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.state.lock().events.push(Event::RolledBack);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().events.push(Event::ConnectionClosed);
        Ok(())
    }
}

struct ScriptedStatement {
    state: Arc<Mutex<ScriptState>>,
    sql: String,
    rows: VecDeque<Row>,
    rows_read: usize,
    read_failure: Option<(usize, String)>,
    update_count: Option<i64>,
    generated_keys: Vec<Row>,
    out_values: Vec<(usize, Value)>,
    batch: Vec<String>,
    closed: bool,
}

impl ScriptedStatement {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::statement("statement is closed"));
        }
        Ok(())
    }

    fn record(&self, event: Event) {
        self.state.lock().events.push(event);
    }
}

impl Statement for ScriptedStatement {
    fn set_query_timeout(&mut self, seconds: u32) -> Result<()> {
        self.record(Event::Timeout(seconds));
        Ok(())
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        self.record(Event::FetchSize(rows));
        Ok(())
    }

    fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
        self.ensure_open()?;
        self.record(Event::Bound {
            index,
            value: value.clone(),
        });
        Ok(())
    }

    fn register_out_parameter(&mut self, index: usize) -> Result<()> {
        self.record(Event::OutRegistered { index });
        Ok(())
    }

    fn execute(&mut self, sql: Option<&str>) -> Result<bool> {
        self.ensure_open()?;
        if let Some(text) = sql {
            self.sql = text.to_string();
        }
        let sql = self.sql.clone();
        let response = {
            let mut state = self.state.lock();
            state.events.push(Event::Executed { sql: sql.clone() });
            state.response(&sql)
        };
        if let Some(reason) = response.error {
            return Err(Error::statement(reason));
        }
        let columns = response.columns;
        self.rows = response
            .rows
            .into_iter()
            .map(|values| Row::new(columns.clone(), values))
            .collect();
        self.rows_read = 0;
        self.read_failure = response.read_failure;
        self.update_count = response.update_count;
        self.generated_keys = response.generated_keys;
        self.out_values = response.out_values;
        Ok(!columns.is_empty())
    }

    fn update_count(&self) -> Option<i64> {
        self.update_count
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        if let Some((after, reason)) = &self.read_failure {
            if self.rows_read == *after {
                return Err(Error::statement(reason.clone()));
            }
        }
        let row = self.rows.pop_front();
        if row.is_some() {
            self.rows_read += 1;
        }
        Ok(row)
    }

    fn generated_keys(&mut self) -> Result<Vec<Row>> {
        Ok(self.generated_keys.clone())
    }

    fn out_parameter(&mut self, index: usize) -> Result<Value> {
        self.out_values
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| Error::statement(format!("no OUT value scripted for parameter {}", index)))
    }

    fn add_batch(&mut self, sql: Option<&str>) -> Result<()> {
        self.ensure_open()?;
        let sql = sql.unwrap_or(self.sql.as_str()).to_string();
        self.record(Event::BatchAdded { sql: sql.clone() });
        self.batch.push(sql);
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<i64>> {
        self.ensure_open()?;
        let entries = std::mem::take(&mut self.batch);
        let sql = entries.first().cloned().unwrap_or_else(|| self.sql.clone());
        let response = {
            let mut state = self.state.lock();
            state.events.push(Event::BatchExecuted {
                sql: sql.clone(),
                entries: entries.len(),
            });
            state.response(&sql)
        };
        if let Some(reason) = response.error {
            return Err(Error::statement(reason));
        }
        let mut counts = Vec::with_capacity(entries.len());
        for index in 0..entries.len() {
            if let Some((failing, reason)) = &response.batch_failure {
                if *failing == index {
                    return Err(Error::BatchUpdate {
                        update_counts: counts,
                        reason: reason.clone(),
                    });
                }
            }
            counts.push(response.update_count.unwrap_or(1));
        }
        self.generated_keys = response.generated_keys;
        Ok(counts)
    }

    fn clear_parameters(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            let mut state = self.state.lock();
            state.open_statements = state.open_statements.saturating_sub(1);
            state.events.push(Event::StatementClosed { sql: self.sql.clone() });
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
