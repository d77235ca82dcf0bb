//! Parameter binding between a [`BoundSql`] and a driver statement.

use bindery_core::{BoundSql, Parameter, Result};
use tracing::debug;

use crate::driver::Statement;

/// Bind every input placeholder in order, reading values from `parameter`.
pub(crate) fn set_parameters(
    statement: &mut dyn Statement,
    bound_sql: &BoundSql,
    parameter: &Parameter,
) -> Result<()> {
    let mut bound = Vec::with_capacity(bound_sql.parameter_mappings.len());
    for (i, mapping) in bound_sql.parameter_mappings.iter().enumerate() {
        if !mapping.mode.is_input() {
            continue;
        }
        let value = parameter.lookup(&mapping.property)?;
        statement.bind(i + 1, &value)?;
        bound.push(value);
    }
    debug!(target: "bindery::statement", parameters = ?bound, "==> Parameters");
    Ok(())
}

/// Declare every OUT/INOUT placeholder of a callable statement.
pub(crate) fn register_out_parameters(statement: &mut dyn Statement, bound_sql: &BoundSql) -> Result<()> {
    for (i, mapping) in bound_sql.parameter_mappings.iter().enumerate() {
        if mapping.mode.is_output() {
            statement.register_out_parameter(i + 1)?;
        }
    }
    Ok(())
}

/// Copy OUT parameter values back into the parameter object.
pub(crate) fn handle_output_parameters(
    statement: &mut dyn Statement,
    bound_sql: &BoundSql,
    parameter: &mut Parameter,
) -> Result<()> {
    for (i, mapping) in bound_sql.parameter_mappings.iter().enumerate() {
        if mapping.mode.is_output() {
            let value = statement.out_parameter(i + 1)?;
            parameter.assign(&mapping.property, value)?;
        }
    }
    Ok(())
}
