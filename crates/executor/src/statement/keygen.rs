//! Key generation around mutations.
//!
//! Two strategies exist: driver-generated keys read after execution, and a
//! separate key query run before or after the mutation.

use bindery_core::{Error, KeyGenerator, MappedCommand, Parameter, Result, Row, Value};
use tracing::debug;

use crate::driver::Statement;

/// Runs the key query of a [`KeyGenerator::SelectKey`].
///
/// Implemented by the executor, which owns the connection the key query
/// must run on.
pub(crate) trait KeyQuery {
    /// Run `command_id` with `parameter` and return every value it produced
    fn select_key(&mut self, command_id: &str, parameter: &Parameter) -> Result<Vec<Value>>;
}

/// Run a key query configured to precede the mutation
pub(crate) fn process_before(
    command: &MappedCommand,
    parameter: &mut Parameter,
    keys: &mut dyn KeyQuery,
) -> Result<()> {
    if let KeyGenerator::SelectKey {
        command_id,
        key_property,
        before: true,
    } = command.key_generator()
    {
        run_select_key(command_id, key_property, parameter, keys)?;
    }
    Ok(())
}

/// Populate keys after a single execution
pub(crate) fn process_after(
    command: &MappedCommand,
    statement: &mut dyn Statement,
    parameter: &mut Parameter,
    keys: &mut dyn KeyQuery,
) -> Result<()> {
    match command.key_generator() {
        KeyGenerator::None => Ok(()),
        KeyGenerator::Generated { key_properties } => {
            let rows = statement.generated_keys()?;
            match rows.first() {
                Some(row) => assign_generated(command, key_properties, row, parameter),
                None => Ok(()),
            }
        }
        KeyGenerator::SelectKey {
            command_id,
            key_property,
            before: false,
        } => run_select_key(command_id, key_property, parameter, keys),
        KeyGenerator::SelectKey { before: true, .. } => Ok(()),
    }
}

/// Populate keys for every parameter of a flushed batch. Driver key rows
/// pair up in submission order with the entries that changed a row.
pub(crate) fn process_batch(
    command: &MappedCommand,
    statement: &mut dyn Statement,
    parameters: &mut [Parameter],
    update_counts: &[i64],
    keys: &mut dyn KeyQuery,
) -> Result<()> {
    match command.key_generator() {
        KeyGenerator::Generated { key_properties } => {
            let rows = statement.generated_keys()?;
            let changed = parameters
                .iter_mut()
                .enumerate()
                .filter(|(i, _)| update_counts.get(*i).map_or(true, |count| *count != 0))
                .map(|(_, parameter)| parameter);
            for (row, parameter) in rows.iter().zip(changed) {
                assign_generated(command, key_properties, row, parameter)?;
            }
            Ok(())
        }
        KeyGenerator::SelectKey {
            command_id,
            key_property,
            before: false,
        } => {
            for parameter in parameters.iter_mut() {
                run_select_key(command_id, key_property, parameter, keys)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn assign_generated(
    command: &MappedCommand,
    key_properties: &[String],
    row: &Row,
    parameter: &mut Parameter,
) -> Result<()> {
    if row.len() < key_properties.len() {
        return Err(Error::executor(format!(
            "too many key properties are specified for command '{}': {} properties, {} generated columns",
            command.id(),
            key_properties.len(),
            row.len()
        )));
    }
    for (property, value) in key_properties.iter().zip(row.values()) {
        parameter.assign(property, value.clone())?;
    }
    Ok(())
}

fn run_select_key(
    command_id: &str,
    key_property: &str,
    parameter: &mut Parameter,
    keys: &mut dyn KeyQuery,
) -> Result<()> {
    debug!(target: "bindery::keygen", command = command_id, property = key_property, "Running key query");
    let mut values = keys.select_key(command_id, parameter)?;
    match values.len() {
        0 => Err(Error::executor(format!(
            "select key '{}' returned no data",
            command_id
        ))),
        1 => parameter.assign(key_property, values.remove(0)),
        _ => Err(Error::executor(format!(
            "select key '{}' returned more than one value",
            command_id
        ))),
    }
}
