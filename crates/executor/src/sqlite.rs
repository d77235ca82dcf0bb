//! SQLite driver on top of `rusqlite`.
//!
//! rusqlite statements borrow their connection, so a [`Statement`] here
//! keeps the SQL text and its bindings and compiles through the
//! connection's statement cache on each execution. Query rows are read
//! into memory at execution time.
//!
//! Manual-commit connections open a transaction (`BEGIN`) before the first
//! statement after each commit or rollback. Stored procedures do not exist
//! in SQLite; `prepare_call` fails.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bindery_core::{Error, Result, Row, Value};
use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use tracing::debug;

use crate::driver::{Connection, DataSource, Statement};

fn sql_error(e: rusqlite::Error) -> Error {
    Error::statement(e.to_string())
}

#[derive(Clone)]
enum Target {
    /// One in-memory database shared by every connection
    Memory(Arc<Mutex<rusqlite::Connection>>),
    File(PathBuf),
}

/// SQLite data source.
#[derive(Clone)]
pub struct SqliteDataSource {
    target: Target,
}

impl SqliteDataSource {
    /// A fresh in-memory database.
    ///
    /// Every connection handed out shares the same database handle, so
    /// sessions over it must not run concurrently.
    pub fn memory() -> Result<Self> {
        let db = rusqlite::Connection::open_in_memory().map_err(sql_error)?;
        Ok(Self {
            target: Target::Memory(Arc::new(Mutex::new(db))),
        })
    }

    /// A database file, opened anew for every connection
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            target: Target::File(path.as_ref().to_path_buf()),
        }
    }

    /// Run a script of `;`-separated statements outside any session
    /// (schema setup, fixtures)
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        let db = self.handle()?;
        let db = db.lock();
        db.execute_batch(sql).map_err(sql_error)
    }

    fn handle(&self) -> Result<Arc<Mutex<rusqlite::Connection>>> {
        match &self.target {
            Target::Memory(db) => Ok(Arc::clone(db)),
            Target::File(path) => {
                let db = rusqlite::Connection::open(path).map_err(sql_error)?;
                Ok(Arc::new(Mutex::new(db)))
            }
        }
    }
}

impl DataSource for SqliteDataSource {
    fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SqliteConnection {
            shared: Arc::new(Shared {
                db: self.handle()?,
                state: Mutex::new(TransactionState {
                    auto_commit: true,
                    in_transaction: false,
                }),
            }),
        }))
    }
}

struct TransactionState {
    auto_commit: bool,
    in_transaction: bool,
}

/// Database handle plus the transaction state of one logical connection
struct Shared {
    db: Arc<Mutex<rusqlite::Connection>>,
    state: Mutex<TransactionState>,
}

impl Shared {
    fn begin_if_needed(&self, db: &rusqlite::Connection) -> Result<()> {
        let mut state = self.state.lock();
        if !state.auto_commit && !state.in_transaction {
            db.execute_batch("BEGIN").map_err(sql_error)?;
            state.in_transaction = true;
        }
        Ok(())
    }

    fn finish(&self, sql: &str) -> Result<()> {
        // Same lock order as statement execution: database, then state
        let db = self.db.lock();
        let mut state = self.state.lock();
        if state.in_transaction {
            debug!(target: "bindery::sqlite", "{}", sql);
            db.execute_batch(sql).map_err(sql_error)?;
            state.in_transaction = false;
        }
        Ok(())
    }
}

struct SqliteConnection {
    shared: Arc<Shared>,
}

impl SqliteConnection {
    fn statement(&self, sql: &str) -> Result<Box<dyn Statement>> {
        if !sql.is_empty() {
            // Compile once so syntax errors surface at prepare time
            let db = self.shared.db.lock();
            db.prepare_cached(sql).map_err(sql_error)?;
        }
        Ok(Box::new(SqliteStatement {
            shared: Arc::clone(&self.shared),
            sql: sql.to_string(),
            bindings: Vec::new(),
            rows: VecDeque::new(),
            update_count: None,
            generated_keys: Vec::new(),
            batch: Vec::new(),
            closed: false,
        }))
    }
}

impl Connection for SqliteConnection {
    fn create_statement(&mut self) -> Result<Box<dyn Statement>> {
        self.statement("")
    }

    fn prepare_statement(&mut self, sql: &str, _return_generated_keys: bool) -> Result<Box<dyn Statement>> {
        self.statement(sql)
    }

    fn prepare_call(&mut self, _sql: &str) -> Result<Box<dyn Statement>> {
        Err(Error::statement("SQLite does not support stored procedure calls"))
    }

    fn auto_commit(&self) -> Result<bool> {
        Ok(self.shared.state.lock().auto_commit)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        if auto_commit {
            self.shared.finish("COMMIT")?;
        }
        self.shared.state.lock().auto_commit = auto_commit;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.shared.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.shared.finish("ROLLBACK")
    }

    fn close(&mut self) -> Result<()> {
        self.shared.finish("ROLLBACK")
    }
}

/// One queued batch entry: text plus bindings
struct BatchEntry {
    sql: String,
    bindings: Vec<SqlValue>,
}

struct SqliteStatement {
    shared: Arc<Shared>,
    sql: String,
    bindings: Vec<SqlValue>,
    rows: VecDeque<Row>,
    update_count: Option<i64>,
    generated_keys: Vec<Row>,
    batch: Vec<BatchEntry>,
    closed: bool,
}

enum Outcome {
    Rows(Vec<Row>),
    Updated { count: i64, last_rowid: i64 },
}

fn run(db: &rusqlite::Connection, sql: &str, bindings: &[SqlValue]) -> Result<Outcome> {
    let mut statement = db.prepare_cached(sql).map_err(sql_error)?;
    let params = rusqlite::params_from_iter(bindings.iter());
    if statement.column_count() == 0 {
        let count = statement.execute(params).map_err(sql_error)?;
        return Ok(Outcome::Updated {
            count: count as i64,
            last_rowid: db.last_insert_rowid(),
        });
    }

    let columns: Vec<String> = statement.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = statement.query(params).map_err(sql_error)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(sql_error)? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(from_sql(row.get_ref(i).map_err(sql_error)?));
        }
        out.push(Row::new(columns.clone(), values));
    }
    Ok(Outcome::Rows(out))
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::Array(_) | Value::Object(_) => {
            SqlValue::Text(serde_json::Value::from(value.clone()).to_string())
        }
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn key_row(rowid: i64) -> Row {
    Row::new(vec!["rowid".to_string()], vec![Value::Int(rowid)])
}

impl SqliteStatement {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::statement("statement is closed"));
        }
        Ok(())
    }
}

impl Statement for SqliteStatement {
    fn set_query_timeout(&mut self, seconds: u32) -> Result<()> {
        let db = self.shared.db.lock();
        db.busy_timeout(Duration::from_secs(u64::from(seconds)))
            .map_err(sql_error)
    }

    fn set_fetch_size(&mut self, _rows: u32) -> Result<()> {
        Ok(())
    }

    fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
        self.ensure_open()?;
        if index == 0 {
            return Err(Error::statement("parameter indexes start at 1"));
        }
        if self.bindings.len() < index {
            self.bindings.resize(index, SqlValue::Null);
        }
        self.bindings[index - 1] = to_sql(value);
        Ok(())
    }

    fn register_out_parameter(&mut self, _index: usize) -> Result<()> {
        Err(Error::statement("SQLite does not support OUT parameters"))
    }

    fn execute(&mut self, sql: Option<&str>) -> Result<bool> {
        self.ensure_open()?;
        let sql = sql.unwrap_or(self.sql.as_str()).to_string();
        let db = self.shared.db.lock();
        self.shared.begin_if_needed(&db)?;
        self.rows.clear();
        self.generated_keys.clear();
        match run(&db, &sql, &self.bindings)? {
            Outcome::Rows(rows) => {
                self.rows = rows.into();
                self.update_count = None;
                Ok(true)
            }
            Outcome::Updated { count, last_rowid } => {
                self.update_count = Some(count);
                if count > 0 {
                    self.generated_keys.push(key_row(last_rowid));
                }
                Ok(false)
            }
        }
    }

    fn update_count(&self) -> Option<i64> {
        self.update_count
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        Ok(self.rows.pop_front())
    }

    fn generated_keys(&mut self) -> Result<Vec<Row>> {
        Ok(self.generated_keys.clone())
    }

    fn out_parameter(&mut self, _index: usize) -> Result<Value> {
        Err(Error::statement("SQLite does not support OUT parameters"))
    }

    fn add_batch(&mut self, sql: Option<&str>) -> Result<()> {
        self.ensure_open()?;
        self.batch.push(BatchEntry {
            sql: sql.unwrap_or(self.sql.as_str()).to_string(),
            bindings: self.bindings.clone(),
        });
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<i64>> {
        self.ensure_open()?;
        let entries = std::mem::take(&mut self.batch);
        let db = self.shared.db.lock();
        self.shared.begin_if_needed(&db)?;
        self.generated_keys.clear();
        let mut counts = Vec::with_capacity(entries.len());
        for entry in &entries {
            match run(&db, &entry.sql, &entry.bindings) {
                Ok(Outcome::Updated { count, last_rowid }) => {
                    counts.push(count);
                    if count > 0 {
                        self.generated_keys.push(key_row(last_rowid));
                    }
                }
                Ok(Outcome::Rows(_)) => {
                    return Err(Error::BatchUpdate {
                        update_counts: counts,
                        reason: format!("batch entry returned rows: {}", entry.sql),
                    })
                }
                Err(e) => {
                    return Err(Error::BatchUpdate {
                        update_counts: counts,
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(counts)
    }

    fn clear_parameters(&mut self) -> Result<()> {
        self.bindings.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
