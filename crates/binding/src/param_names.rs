//! Naming call arguments and packing them into one parameter object.

use bindery_core::{Error, ParamMap, Parameter, Result, Value};

use crate::binder::Arg;
use crate::contract::{MethodDecl, ParamKind};

const GENERIC_NAME_PREFIX: &str = "param";

/// Stable names for the value parameters of one method.
///
/// Pagination and row-callback parameters are not named. A value parameter
/// takes its alias when it has one, else its declared name when
/// `use_actual_param_name` is set, else its position among the value
/// parameters (`"0"`, `"1"`...).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamNameResolver {
    /// (argument index, name) in declaration order
    names: Vec<(usize, String)>,
    has_alias: bool,
}

impl ParamNameResolver {
    /// Names for `method`
    pub fn new(method: &MethodDecl, use_actual_param_name: bool) -> Self {
        let mut names = Vec::new();
        let mut has_alias = false;
        for (index, param) in method.params().iter().enumerate() {
            if !matches!(param.kind(), ParamKind::Value(_)) {
                continue;
            }
            let name = match param.alias() {
                Some(alias) => {
                    has_alias = true;
                    alias.to_string()
                }
                None if use_actual_param_name => param.name().to_string(),
                None => names.len().to_string(),
            };
            names.push((index, name));
        }
        Self { names, has_alias }
    }

    /// Resolved names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(|(_, name)| name.as_str()).collect()
    }

    /// Pack the value arguments of a call.
    ///
    /// No value parameters give [`Parameter::None`]; one un-aliased
    /// parameter is passed through as [`Parameter::Single`]; anything else
    /// becomes a [`ParamMap`] holding every name plus the generic aliases
    /// `param1..paramN` that do not clash with a declared name.
    pub fn named_params(&self, args: &[Arg<'_>]) -> Result<Parameter> {
        if self.names.is_empty() {
            return Ok(Parameter::None);
        }
        if !self.has_alias && self.names.len() == 1 {
            let (index, _) = &self.names[0];
            return Ok(Parameter::Single(value_at(args, *index)?.clone()));
        }

        let mut map = ParamMap::new();
        for (position, (index, name)) in self.names.iter().enumerate() {
            let value = value_at(args, *index)?;
            map.insert(name.clone(), value.clone());
            let generic = format!("{}{}", GENERIC_NAME_PREFIX, position + 1);
            if !self.names.iter().any(|(_, n)| *n == generic) {
                map.insert(generic, value.clone());
            }
        }
        Ok(Parameter::Named(map))
    }

    /// Copy values the execution wrote into `parameter` back into `args`.
    ///
    /// Only slots whose value actually changed are touched.
    pub fn write_back(&self, parameter: &Parameter, args: &mut [Arg<'_>]) {
        let updated = |name: &str| match parameter {
            Parameter::Single(value) => Some(value),
            Parameter::Named(_) => parameter.named_value(name),
            Parameter::None => None,
        };
        for (index, name) in &self.names {
            let Some(value) = updated(name) else {
                continue;
            };
            if let Some(Arg::Value(slot)) = args.get_mut(*index) {
                if slot != value {
                    *slot = value.clone();
                }
            }
        }
    }
}

fn value_at<'a>(args: &'a [Arg<'_>], index: usize) -> Result<&'a Value> {
    match args.get(index) {
        Some(Arg::Value(value)) => Ok(value),
        _ => Err(Error::binding(format!("argument {} is not a value", index))),
    }
}
