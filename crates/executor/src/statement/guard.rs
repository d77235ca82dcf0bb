//! Scoped statement release.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::driver::Statement;

/// Closes its statement on every exit path unless ownership is released to
/// a longer-lived holder (a cursor or the reuse cache).
pub(crate) struct StatementGuard {
    statement: Option<Box<dyn Statement>>,
}

impl StatementGuard {
    pub(crate) fn new(statement: Box<dyn Statement>) -> Self {
        Self {
            statement: Some(statement),
        }
    }

    /// Hand the statement over without closing it
    pub(crate) fn into_inner(mut self) -> Box<dyn Statement> {
        self.statement
            .take()
            .expect("statement present until released")
    }
}

impl Deref for StatementGuard {
    type Target = dyn Statement;

    fn deref(&self) -> &Self::Target {
        self.statement
            .as_deref()
            .expect("statement present until released")
    }
}

impl DerefMut for StatementGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.statement
            .as_deref_mut()
            .expect("statement present until released")
    }
}

impl Drop for StatementGuard {
    fn drop(&mut self) {
        if let Some(mut statement) = self.statement.take() {
            close_quietly(statement.as_mut());
        }
    }
}

/// Close a statement, logging instead of propagating a failure so it never
/// masks the error that brought us here.
pub(crate) fn close_quietly(statement: &mut dyn Statement) {
    if statement.is_closed() {
        return;
    }
    if let Err(e) = statement.close() {
        debug!(target: "bindery::statement", error = %e, "Ignoring failure while closing statement");
    }
}
