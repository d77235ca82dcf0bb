//! Error types for binding and executing commands.
//!
//! All errors are represented by the [`Error`] enum. Errors are:
//! - **Structured**: each variant has typed fields for the details
//! - **Fatal**: nothing in this workspace retries; every error surfaces to the caller
//! - **Lossless**: driver failures keep the driver's message unchanged

use crate::result::BatchResult;

/// Result type alias used across every bindery crate
pub type Result<T> = std::result::Result<T, Error>;

/// Binding, coercion and execution errors.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Binding | `Binding`, `CommandNotFound` | Contract method cannot be bound or dispatched |
/// | Coercion | `NullIntoPrimitive`, `Coercion` | Raw result does not fit the declared type |
/// | Parameters | `ParameterNotFound`, `NoSuchProperty` | Caller supplied the wrong parameter names |
/// | Results | `TooManyResults` | `select_one` saw more than one row |
/// | Statement | `Statement`, `BatchUpdate`, `PartialBatch` | Surfaced from the driver |
/// | Lifecycle | `Executor`, `Transaction` | Session/executor state errors |
/// | Setup | `Config` | Configuration parse or validation failure |
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // ==================== Binding ====================
    /// A contract method cannot be bound (not found, duplicate special
    /// parameter, unsupported return type, unknown command kind...)
    #[error("binding failure: {reason}")]
    Binding { reason: String },

    /// No command registered under this identifier
    #[error("command registry does not contain a command with id '{id}'")]
    CommandNotFound { id: String },

    // ==================== Coercion ====================
    /// Null result for a method declaring a primitive return type
    #[error("mapper method '{command}' attempted to return null from a method with a primitive return type ({return_type})")]
    NullIntoPrimitive { command: String, return_type: String },

    /// A value could not be converted to the declared element type
    #[error("coercion failure: {reason}")]
    Coercion { reason: String },

    // ==================== Parameters ====================
    /// Lookup of a parameter name that the call did not bind
    #[error("parameter '{name}' not found. Available parameters are {available:?}")]
    ParameterNotFound { name: String, available: Vec<String> },

    /// Property path missing on a parameter object
    #[error("there is no property named '{property}' in '{type_name}'")]
    NoSuchProperty { property: String, type_name: String },

    // ==================== Results ====================
    /// `select_one` produced more than one row
    #[error("expected one result (or none) to be returned by select_one, but found: {found}")]
    TooManyResults { found: usize },

    // ==================== Statement ====================
    /// Execution error surfaced unchanged from the driver
    #[error("statement failure: {reason}")]
    Statement { reason: String },

    /// Driver-level batch failure; `update_counts` holds the counts of the
    /// entries of this batch that ran before the failing one
    #[error("batch update failure after {} successful entries: {reason}", .update_counts.len())]
    BatchUpdate { update_counts: Vec<i64>, reason: String },

    /// A queued batch failed while flushing
    #[error(
        "error executing batch statement #{} (command '{command_id}'): {reason}; {} prior batch statement(s) succeeded, {} entries of the failing batch succeeded",
        .statement_index + 1,
        .successful.len(),
        .update_counts.len()
    )]
    PartialBatch {
        /// Zero-based position of the failing statement in submission order
        statement_index: usize,
        command_id: String,
        sql: String,
        /// Counts of the entries of the failing batch that succeeded
        update_counts: Vec<i64>,
        /// Results of every statement flushed before the failing one
        successful: Vec<BatchResult>,
        reason: String,
    },

    // ==================== Lifecycle ====================
    /// Executor state error (closed executor, cursor misuse...)
    #[error("executor error: {reason}")]
    Executor { reason: String },

    /// Commit, rollback or close of the transaction failed
    #[error("transaction error: {reason}")]
    Transaction { reason: String },

    // ==================== Setup ====================
    /// Configuration could not be parsed or validated
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl Error {
    /// Shorthand for a [`Error::Binding`]
    pub fn binding(reason: impl Into<String>) -> Self {
        Error::Binding {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Statement`]
    pub fn statement(reason: impl Into<String>) -> Self {
        Error::Statement {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Executor`]
    pub fn executor(reason: impl Into<String>) -> Self {
        Error::Executor {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Config`]
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }
}
