//! Parameter objects handed to a command.
//!
//! A call's arguments are packed into one [`Parameter`]. Placeholders of the
//! command's SQL read from it by property path, and post-execution hooks
//! (generated keys, OUT parameters) write back into it.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Named arguments of one call.
///
/// Lookups of absent names fail with [`Error::ParameterNotFound`] listing the
/// names that are bound, instead of answering null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: BTreeMap<String, Value>,
}

impl ParamMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Look up a bound name.
    ///
    /// # Errors
    ///
    /// [`Error::ParameterNotFound`] when `name` is not bound.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.entries.get(name).ok_or_else(|| Error::ParameterNotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Value> {
        let available = if self.entries.contains_key(name) {
            Vec::new()
        } else {
            self.names()
        };
        self.entries.get_mut(name).ok_or_else(|| Error::ParameterNotFound {
            name: name.to_string(),
            available,
        })
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bound names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of bound names (aliases included)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// The single parameter object of a command invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Parameter {
    /// The call had no value arguments
    #[default]
    None,
    /// Exactly one un-aliased argument, passed through as-is
    Single(Value),
    /// Several (or aliased) arguments by name
    Named(ParamMap),
}

impl Parameter {
    /// Resolve the value a placeholder reads.
    ///
    /// - `None` resolves every property to null
    /// - a single scalar resolves to itself, whatever the property name
    /// - a single object resolves the property path on it
    /// - a `ParamMap` resolves the first segment by name and the rest as a path
    pub fn lookup(&self, property: &str) -> Result<Value> {
        match self {
            Parameter::None => Ok(Value::Null),
            Parameter::Single(value @ Value::Object(_)) => {
                value.property(property).cloned().ok_or_else(|| Error::NoSuchProperty {
                    property: property.to_string(),
                    type_name: value.type_name().to_string(),
                })
            }
            Parameter::Single(value) => Ok(value.clone()),
            Parameter::Named(map) => {
                let (head, tail) = split_head(property);
                let value = map.get(head)?;
                match tail {
                    None => Ok(value.clone()),
                    Some(path) => value.property(path).cloned().ok_or_else(|| {
                        Error::NoSuchProperty {
                            property: property.to_string(),
                            type_name: value.type_name().to_string(),
                        }
                    }),
                }
            }
        }
    }

    /// Write `value` at a property path (generated keys, OUT parameters).
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchProperty`] when the path cannot be reached, including
    /// any attempt to assign a property on a scalar or empty parameter.
    pub fn assign(&mut self, property: &str, value: Value) -> Result<()> {
        let no_such = |type_name: &str| Error::NoSuchProperty {
            property: property.to_string(),
            type_name: type_name.to_string(),
        };
        match self {
            Parameter::None => Err(no_such("null")),
            Parameter::Single(target) => {
                if target.set_property(property, value) {
                    Ok(())
                } else {
                    Err(no_such(target.type_name()))
                }
            }
            Parameter::Named(map) => match split_head(property) {
                (head, None) => {
                    map.insert(head, value);
                    Ok(())
                }
                (head, Some(path)) => {
                    let target = map.get_mut(head)?;
                    if target.set_property(path, value) {
                        Ok(())
                    } else {
                        Err(no_such(target.type_name()))
                    }
                }
            },
        }
    }

    /// The value a named argument currently holds, if any
    pub fn named_value(&self, name: &str) -> Option<&Value> {
        match self {
            Parameter::Named(map) => map.entries.get(name),
            _ => None,
        }
    }

    /// Wrap a single array argument under the `list` and `collection` names.
    pub fn wrap_collection(self) -> Self {
        match self {
            Parameter::Single(value @ Value::Array(_)) => {
                let mut map = ParamMap::new();
                map.insert("collection", value.clone());
                map.insert("list", value);
                Parameter::Named(map)
            }
            other => other,
        }
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Parameter::Single(value)
    }
}

impl From<ParamMap> for Parameter {
    fn from(map: ParamMap) -> Self {
        Parameter::Named(map)
    }
}

fn split_head(property: &str) -> (&str, Option<&str>) {
    match property.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (property, None),
    }
}
