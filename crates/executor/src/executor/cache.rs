//! Per-session query cache.

use bindery_core::{BoundSql, MappedCommand, Parameter, Result, RowBounds, Value};
use rustc_hash::FxHashMap;

/// Identity of one query execution: command, row window, SQL text and the
/// values bound to its input placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    command_id: String,
    offset: usize,
    limit: usize,
    sql: String,
    parameters: Vec<String>,
}

impl CacheKey {
    pub(crate) fn new(
        command: &MappedCommand,
        bounds: RowBounds,
        bound_sql: &BoundSql,
        parameter: &Parameter,
    ) -> Result<Self> {
        let mut parameters = Vec::with_capacity(bound_sql.parameter_mappings.len());
        for mapping in &bound_sql.parameter_mappings {
            if mapping.mode.is_input() {
                // Value holds floats, so the debug rendering stands in for a hash
                parameters.push(format!("{:?}", parameter.lookup(&mapping.property)?));
            }
        }
        Ok(Self {
            command_id: command.id().to_string(),
            offset: bounds.offset,
            limit: bounds.limit,
            sql: bound_sql.sql.clone(),
            parameters,
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct LocalCache {
    entries: FxHashMap<CacheKey, Vec<Value>>,
}

impl LocalCache {
    pub(crate) fn get(&self, key: &CacheKey) -> Option<&Vec<Value>> {
        self.entries.get(key)
    }

    pub(crate) fn put(&mut self, key: CacheKey, rows: Vec<Value>) {
        self.entries.insert(key, rows);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{CommandKind, ParamMap};

    fn command() -> MappedCommand {
        MappedCommand::builder("UserMapper.find", CommandKind::Select, "SELECT * FROM users WHERE id = #{id}")
            .unwrap()
            .build()
    }

    fn key_for(id: i64) -> CacheKey {
        let command = command();
        let mut map = ParamMap::new();
        map.insert("id", Value::Int(id));
        let parameter = Parameter::Named(map);
        let bound = command.sql_source().bound_sql(&parameter).unwrap();
        CacheKey::new(&command, RowBounds::DEFAULT, &bound, &parameter).unwrap()
    }

    #[test]
    fn test_same_inputs_same_key() {
        assert_eq!(key_for(1), key_for(1));
        assert_ne!(key_for(1), key_for(2));
    }

    #[test]
    fn test_put_get_clear() {
        let mut cache = LocalCache::default();
        cache.put(key_for(1), vec![Value::Int(10)]);
        assert_eq!(cache.get(&key_for(1)), Some(&vec![Value::Int(10)]));
        assert!(cache.get(&key_for(2)).is_none());
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
