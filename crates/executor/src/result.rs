//! Reading rows out of an executed statement.

use bindery_core::{Error, Result, ResultContext, ResultMap, RowBounds, RowHandler, RowMapper, Value};
use tracing::debug;

use crate::driver::Statement;

/// Maps the rows of one execution within a [`RowBounds`] window.
pub(crate) struct ResultSetHandler<'a> {
    pub(crate) mapper: &'a dyn RowMapper,
    pub(crate) result_type: Option<&'a str>,
    pub(crate) bounds: RowBounds,
}

impl ResultSetHandler<'_> {
    /// Read every row up to the limit.
    ///
    /// With a row handler each mapped row goes to the handler (which may
    /// stop the read) and the returned list is empty; without one the rows
    /// are collected and returned in order.
    pub(crate) fn handle_rows(
        &self,
        statement: &mut dyn Statement,
        mut handler: Option<&mut dyn RowHandler>,
    ) -> Result<Vec<Value>> {
        if !skip_rows(statement, self.bounds.offset)? {
            return Ok(Vec::new());
        }

        let mut context = ResultContext::new();
        let mut collected = Vec::new();
        let mut produced = 0usize;
        while produced < self.bounds.limit {
            let Some(row) = statement.next_row()? else {
                break;
            };
            let value = self.mapper.map_row(&row, self.result_type)?;
            produced += 1;
            match handler.as_deref_mut() {
                Some(handler) => {
                    context.next_result(value);
                    handler.handle_result(&mut context);
                    if context.is_stopped() {
                        break;
                    }
                }
                None => collected.push(value),
            }
        }
        debug!(target: "bindery::result", total = produced, "<== Total");
        Ok(collected)
    }
}

/// Advance past `offset` rows; false when the rows ran out first
pub(crate) fn skip_rows(statement: &mut dyn Statement, offset: usize) -> Result<bool> {
    for _ in 0..offset {
        if statement.next_row()?.is_none() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Groups mapped rows into a [`ResultMap`] keyed by one of their properties.
#[derive(Debug)]
pub(crate) struct MapResultHandler<'a> {
    map_key: &'a str,
    map: ResultMap,
    error: Option<Error>,
}

impl<'a> MapResultHandler<'a> {
    pub(crate) fn new(map_key: &'a str) -> Self {
        Self {
            map_key,
            map: ResultMap::new(),
            error: None,
        }
    }

    /// The grouped rows, or the first key lookup failure
    pub(crate) fn finish(self) -> Result<ResultMap> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.map),
        }
    }
}

impl RowHandler for MapResultHandler<'_> {
    fn handle_result(&mut self, context: &mut ResultContext) {
        let value = context.take_result();
        match value.property(self.map_key).cloned() {
            Some(key) => self.map.insert(key, value),
            None => {
                self.error = Some(Error::NoSuchProperty {
                    property: self.map_key.to_string(),
                    type_name: value.type_name().to_string(),
                });
                context.stop();
            }
        }
    }
}
