//! Lazy, forward-only query results.
//!
//! A [`Cursor`] owns the statement it reads from and maps one row per
//! [`Iterator::next`] call. It can be iterated once. The statement is
//! closed when the rows run out, on [`Cursor::close`], or on drop,
//! whichever comes first.

use std::fmt;
use std::sync::Arc;

use bindery_core::{Result, RowBounds, RowMapper, Value};

use crate::driver::Statement;
use crate::result::skip_rows;
use crate::statement::close_quietly;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Open,
    Consumed,
    Closed,
}

/// Streaming result of a cursor query.
pub struct Cursor {
    statement: Option<Box<dyn Statement>>,
    mapper: Arc<dyn RowMapper>,
    result_type: Option<String>,
    bounds: RowBounds,
    skipped: bool,
    index: usize,
    state: CursorState,
}

impl Cursor {
    pub(crate) fn new(
        statement: Box<dyn Statement>,
        mapper: Arc<dyn RowMapper>,
        result_type: Option<String>,
        bounds: RowBounds,
    ) -> Self {
        Self {
            statement: Some(statement),
            mapper,
            result_type,
            bounds,
            skipped: false,
            index: 0,
            state: CursorState::Open,
        }
    }

    /// True until the rows run out or the cursor is closed
    pub fn is_open(&self) -> bool {
        self.state == CursorState::Open
    }

    /// True once every row within the bounds was read
    pub fn is_consumed(&self) -> bool {
        self.state == CursorState::Consumed
    }

    /// Number of rows handed out so far
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Release the statement early; later `next` calls return `None`
    pub fn close(&mut self) {
        self.release();
        if self.state == CursorState::Open {
            self.state = CursorState::Closed;
        }
    }

    fn release(&mut self) {
        if let Some(mut statement) = self.statement.take() {
            close_quietly(statement.as_mut());
        }
    }

    fn fetch(&mut self) -> Result<Option<Value>> {
        let Some(statement) = self.statement.as_deref_mut() else {
            return Ok(None);
        };
        if !self.skipped {
            self.skipped = true;
            if !skip_rows(statement, self.bounds.offset)? {
                return Ok(None);
            }
        }
        if self.index >= self.bounds.limit {
            return Ok(None);
        }
        match statement.next_row()? {
            Some(row) => {
                let value = self.mapper.map_row(&row, self.result_type.as_deref())?;
                self.index += 1;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl Iterator for Cursor {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state != CursorState::Open {
            return None;
        }
        match self.fetch() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.state = CursorState::Consumed;
                self.release();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("state", &self.state)
            .field("index", &self.index)
            .field("result_type", &self.result_type)
            .finish()
    }
}
