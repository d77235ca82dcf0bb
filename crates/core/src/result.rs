//! Rows, pagination bounds, row callbacks and batch results.

use crate::param::Parameter;
use crate::value::Value;

/// One driver row: column labels and their values, in select-list order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row. `columns` and `values` must have equal lengths.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column labels
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column values
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of a column by label (case-insensitive)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a row without columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(label, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Logical pagination over a result sequence.
///
/// Rows before `offset` are read and discarded; reading stops once `limit`
/// rows were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowBounds {
    pub offset: usize,
    pub limit: usize,
}

impl RowBounds {
    /// Bounds that let every row through
    pub const DEFAULT: RowBounds = RowBounds {
        offset: 0,
        limit: usize::MAX,
    };

    /// Skip `offset` rows, then produce at most `limit`
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// True when these bounds neither skip nor cap anything
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What a row callback sees for each mapped row
#[derive(Debug)]
pub struct ResultContext {
    result: Value,
    count: usize,
    stopped: bool,
}

impl ResultContext {
    /// Context for the first row
    pub fn new() -> Self {
        Self {
            result: Value::Null,
            count: 0,
            stopped: false,
        }
    }

    /// Advance to the next mapped row
    pub fn next_result(&mut self, result: Value) {
        self.result = result;
        self.count += 1;
    }

    /// The current mapped row
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Take ownership of the current mapped row, leaving null behind
    pub fn take_result(&mut self) -> Value {
        std::mem::replace(&mut self.result, Value::Null)
    }

    /// How many rows were handed to the callback so far (this one included)
    pub fn result_count(&self) -> usize {
        self.count
    }

    /// Ask the reader to stop after this row
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether `stop` was requested
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Default for ResultContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-row callback for streaming consumption instead of buffering.
pub trait RowHandler {
    /// Called once per mapped row, in row order
    fn handle_result(&mut self, context: &mut ResultContext);
}

impl<F> RowHandler for F
where
    F: FnMut(&mut ResultContext),
{
    fn handle_result(&mut self, context: &mut ResultContext) {
        self(context)
    }
}

/// Rows re-keyed by a grouping property, in first-insertion order.
///
/// Inserting an equal key replaces the previous value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMap {
    entries: Vec<(Value, Value)>,
}

impl ResultMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value stored under `key`
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// Outcome of one flushed batch statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub command_id: String,
    pub sql: String,
    /// Parameter objects queued on this statement, in submission order
    pub parameters: Vec<Parameter>,
    /// One count per queued parameter once flushed
    pub update_counts: Vec<i64>,
}

impl BatchResult {
    /// An empty result for a statement about to be queued
    pub fn new(command_id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            sql: sql.into(),
            parameters: Vec::new(),
            update_counts: Vec::new(),
        }
    }
}
