//! What a bound method call returns.

use bindery_core::{BatchResult, DeclaredCollection, ResultMap, Value};
use bindery_executor::Cursor;

/// The caller-visible result of [`MethodBinder::execute`].
///
/// [`MethodBinder::execute`]: crate::MethodBinder::execute
#[derive(Debug)]
pub enum Output {
    /// `void` methods and row-callback queries
    Unit,
    /// Row count coerced to a boolean (`count > 0`)
    Bool(bool),
    /// Row count of an integer-returning mutation
    Int(i64),
    /// A single row or scalar
    Value(Value),
    /// A single row wrapped in an optional
    Optional(Option<Value>),
    /// Rows as a list, assignable as-is
    List(Vec<Value>),
    /// Rows copied into a freshly allocated array
    Array(Vec<Value>),
    /// Rows appended to a declared collection instance
    Collection(DeclaredCollection),
    /// Rows grouped by their key property
    Map(ResultMap),
    /// Lazily read rows
    Cursor(Cursor),
    /// Results of a flush of pending batch statements
    Batch(Vec<BatchResult>),
}

impl Output {
    /// True for [`Output::Unit`]
    pub fn is_unit(&self) -> bool {
        matches!(self, Output::Unit)
    }

    /// The row count of an integer mutation
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Output::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The coerced row count of a boolean mutation
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Output::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The elements of a list, array or collection result
    pub fn into_items(self) -> Option<Vec<Value>> {
        match self {
            Output::List(items) | Output::Array(items) => Some(items),
            Output::Collection(collection) => Some(collection.into_items()),
            _ => None,
        }
    }

    /// The single value of a scalar result
    pub fn into_value(self) -> Option<Value> {
        match self {
            Output::Value(value) => Some(value),
            _ => None,
        }
    }
}
