//! Mapping of driver rows to values.
//!
//! The full object-graph mapping algorithm lives outside this workspace;
//! [`RowMapper`] is the seam it plugs into. [`DefaultRowMapper`] covers the
//! two common shapes: scalar result types take the first column, everything
//! else becomes an object keyed by column label.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::result::Row;
use crate::value::Value;

/// Converts one row into the value a query produces for it.
pub trait RowMapper: Send + Sync + fmt::Debug {
    /// Map `row`; `result_type` is the command's declared row type
    fn map_row(&self, row: &Row, result_type: Option<&str>) -> Result<Value>;
}

/// Column-label based mapper.
#[derive(Debug, Clone, Default)]
pub struct DefaultRowMapper {
    map_underscore_to_camel_case: bool,
}

impl DefaultRowMapper {
    /// Create a mapper; `camel_case` turns `created_at` into `createdAt`
    pub fn new(camel_case: bool) -> Self {
        Self {
            map_underscore_to_camel_case: camel_case,
        }
    }

    fn field_name(&self, column: &str) -> String {
        if !self.map_underscore_to_camel_case {
            return column.to_string();
        }
        let mut out = String::with_capacity(column.len());
        let mut upper_next = false;
        for ch in column.chars() {
            if ch == '_' {
                upper_next = !out.is_empty();
            } else if upper_next {
                out.extend(ch.to_uppercase());
                upper_next = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        }
        out
    }
}

impl RowMapper for DefaultRowMapper {
    fn map_row(&self, row: &Row, result_type: Option<&str>) -> Result<Value> {
        if let Some(scalar) = result_type.and_then(ScalarType::parse) {
            let first = row.values().first().cloned().unwrap_or(Value::Null);
            return scalar.coerce(first);
        }
        let fields: BTreeMap<String, Value> = row
            .iter()
            .map(|(column, value)| (self.field_name(column), value.clone()))
            .collect();
        Ok(Value::Object(fields))
    }
}

/// Result type names that map to a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    Bool,
    Int,
    Float,
    String,
    Any,
}

impl ScalarType {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(ScalarType::Bool),
            "int" | "integer" | "long" | "short" | "byte" => Some(ScalarType::Int),
            "float" | "double" => Some(ScalarType::Float),
            "string" | "str" => Some(ScalarType::String),
            "value" | "object" => Some(ScalarType::Any),
            _ => None,
        }
    }

    fn coerce(self, value: Value) -> Result<Value> {
        let mismatch = |value: &Value| Error::Coercion {
            reason: format!("cannot read column of type {} as {:?}", value.type_name(), self),
        };
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ScalarType::Any, v) => Ok(v),
            (ScalarType::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (ScalarType::Bool, Value::Int(i)) => Ok(Value::Bool(i != 0)),
            (ScalarType::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (ScalarType::Int, Value::Bool(b)) => Ok(Value::Int(b as i64)),
            (ScalarType::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (ScalarType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (ScalarType::String, Value::String(s)) => Ok(Value::String(s)),
            (ScalarType::String, Value::Int(i)) => Ok(Value::String(i.to_string())),
            (_, v) => Err(mismatch(&v)),
        }
    }
}
