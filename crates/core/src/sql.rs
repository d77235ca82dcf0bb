//! Compiled SQL templates.
//!
//! A [`SqlSource`] turns a call's parameter object into a [`BoundSql`]: the
//! SQL text to send plus the ordered parameter mappings to bind. The only
//! source shipped here is [`StaticSqlSource`], which compiles `#{...}`
//! placeholders once at command-build time. Dynamic templates plug in
//! through the same trait.

use std::fmt;

use crate::error::{Error, Result};
use crate::param::Parameter;

/// Direction of a bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMode {
    In,
    Out,
    InOut,
}

impl ParameterMode {
    /// True when the driver must receive a value for this parameter
    pub fn is_input(&self) -> bool {
        matches!(self, ParameterMode::In | ParameterMode::InOut)
    }

    /// True when the value is read back after execution
    pub fn is_output(&self) -> bool {
        matches!(self, ParameterMode::Out | ParameterMode::InOut)
    }
}

/// One `?` placeholder: the property it reads from and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMapping {
    pub property: String,
    pub mode: ParameterMode,
}

/// SQL text plus ordered parameter mappings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSql {
    pub sql: String,
    pub parameter_mappings: Vec<ParameterMapping>,
}

/// Produces the [`BoundSql`] for a parameter object.
pub trait SqlSource: Send + Sync + fmt::Debug {
    /// Build the SQL for one call
    fn bound_sql(&self, parameter: &Parameter) -> Result<BoundSql>;
}

/// A template whose text does not depend on the parameter values.
///
/// `#{name}` becomes `?`; options follow a comma, e.g. `#{total,mode=OUT}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSqlSource {
    bound: BoundSql,
}

impl StaticSqlSource {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unterminated placeholder, an empty
    /// property name or an unknown option.
    pub fn parse(template: &str) -> Result<Self> {
        let mut sql = String::with_capacity(template.len());
        let mut mappings = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("#{") {
            sql.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                Error::config(format!("unterminated placeholder in SQL: {}", template))
            })?;
            mappings.push(parse_placeholder(&after[..end], template)?);
            sql.push('?');
            rest = &after[end + 1..];
        }
        sql.push_str(rest);

        Ok(Self {
            bound: BoundSql {
                sql: sql.trim().to_string(),
                parameter_mappings: mappings,
            },
        })
    }

    /// The compiled SQL text
    pub fn sql(&self) -> &str {
        &self.bound.sql
    }
}

fn parse_placeholder(content: &str, template: &str) -> Result<ParameterMapping> {
    let mut parts = content.split(',').map(str::trim);
    let property = parts.next().unwrap_or_default();
    if property.is_empty() {
        return Err(Error::config(format!(
            "empty placeholder property in SQL: {}",
            template
        )));
    }

    let mut mode = ParameterMode::In;
    for option in parts {
        let (key, value) = option.split_once('=').ok_or_else(|| {
            Error::config(format!("malformed placeholder option '{}' in SQL: {}", option, template))
        })?;
        match (key.trim(), value.trim().to_ascii_uppercase().as_str()) {
            ("mode", "IN") => mode = ParameterMode::In,
            ("mode", "OUT") => mode = ParameterMode::Out,
            ("mode", "INOUT") => mode = ParameterMode::InOut,
            // Type hints are accepted and left to the driver
            ("jdbcType", _) | ("javaType", _) => {}
            _ => {
                return Err(Error::config(format!(
                    "unknown placeholder option '{}' in SQL: {}",
                    option, template
                )))
            }
        }
    }

    Ok(ParameterMapping {
        property: property.to_string(),
        mode,
    })
}

impl SqlSource for StaticSqlSource {
    fn bound_sql(&self, _parameter: &Parameter) -> Result<BoundSql> {
        Ok(self.bound.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_compile_to_question_marks() {
        let source = StaticSqlSource::parse("SELECT * FROM users WHERE id = #{id} AND name = #{ name }").unwrap();
        let bound = source.bound_sql(&Parameter::None).unwrap();
        assert_eq!(bound.sql, "SELECT * FROM users WHERE id = ? AND name = ?");
        let props: Vec<_> = bound.parameter_mappings.iter().map(|m| m.property.as_str()).collect();
        assert_eq!(props, vec!["id", "name"]);
    }

    #[test]
    fn test_mode_option() {
        let source = StaticSqlSource::parse("{call count_users(#{active}, #{total,mode=OUT}, #{x, mode=inout})}").unwrap();
        let modes: Vec<_> = source.bound.parameter_mappings.iter().map(|m| m.mode).collect();
        assert_eq!(modes, vec![ParameterMode::In, ParameterMode::Out, ParameterMode::InOut]);
        assert_eq!(source.sql(), "{call count_users(?, ?, ?)}");
    }

    #[test]
    fn test_unterminated_placeholder_is_config_error() {
        let err = StaticSqlSource::parse("SELECT #{id").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_unknown_option_is_config_error() {
        let err = StaticSqlSource::parse("SELECT #{id,scale=2}").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    proptest::proptest! {
        #[test]
        fn prop_one_mapping_per_placeholder(names in proptest::collection::vec("[a-z][a-z0-9_]{0,8}", 0..6)) {
            let template = names
                .iter()
                .map(|n| format!("c_{n} = #{{{n}}}"))
                .collect::<Vec<_>>()
                .join(" AND ");
            let source = StaticSqlSource::parse(&format!("SELECT * FROM t WHERE {template}")).unwrap();
            let props: Vec<String> = source.bound.parameter_mappings.iter().map(|m| m.property.clone()).collect();
            proptest::prop_assert_eq!(props, names.clone());
            proptest::prop_assert_eq!(source.sql().matches('?').count(), names.len());
        }
    }

    #[test]
    fn test_text_without_placeholders_is_kept() {
        let source = StaticSqlSource::parse("  DELETE FROM users  ").unwrap();
        assert_eq!(source.sql(), "DELETE FROM users");
        assert!(source.bound.parameter_mappings.is_empty());
    }
}
