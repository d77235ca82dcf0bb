//! Coercing raw session results into declared return types.

use bindery_core::{Configuration, Error, PrimitiveKind, Result, TypeDesc, Value};

use crate::output::Output;
use crate::signature::{ReturnKind, SignatureDescriptor};

/// Shapes results for one bound method
pub struct ResultShaper<'a> {
    config: &'a Configuration,
    signature: &'a SignatureDescriptor,
}

impl<'a> ResultShaper<'a> {
    /// Shaper for `signature`
    pub fn new(config: &'a Configuration, signature: &'a SignatureDescriptor) -> Self {
        Self { config, signature }
    }

    /// Whether a mutation may declare `ty` as its return type
    pub fn supports_row_count(ty: &TypeDesc) -> bool {
        match ty {
            TypeDesc::Void => true,
            ty => matches!(
                ty.scalar_kind(),
                Some(PrimitiveKind::Bool | PrimitiveKind::Int | PrimitiveKind::Long)
            ),
        }
    }

    /// Coerce an affected-row count.
    ///
    /// `void` discards it, boolean kinds answer `count > 0`, `int` and
    /// `long` kinds pass it through.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] for any other declared type.
    pub fn row_count(&self, count: i64) -> Result<Output> {
        let ty = self.signature.return_type();
        match (ty, ty.scalar_kind()) {
            (TypeDesc::Void, _) => Ok(Output::Unit),
            (_, Some(PrimitiveKind::Bool)) => Ok(Output::Bool(count > 0)),
            (_, Some(PrimitiveKind::Int | PrimitiveKind::Long)) => Ok(Output::Int(count)),
            _ => Err(unsupported_return_type(ty)),
        }
    }

    /// Convert a list result to the declared many-shaped type.
    ///
    /// Lists are returned as-is when the declared collection accepts them.
    /// Arrays are freshly allocated, converting each element for primitive
    /// components. Any other collection is created through the object
    /// factory and filled in row order.
    pub fn many(&self, rows: Vec<Value>) -> Result<Output> {
        match self.signature.return_type() {
            TypeDesc::Array(component) => match component.as_ref() {
                TypeDesc::Primitive(kind) => {
                    let items = rows
                        .into_iter()
                        .map(|value| to_primitive(*kind, value))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Output::Array(items))
                }
                _ => Ok(Output::Array(rows)),
            },
            TypeDesc::Collection(kind, _) if kind.accepts_list() => Ok(Output::List(rows)),
            ty if self.config.object_factory().is_collection(ty) => {
                let mut collection = self.config.object_factory().create_collection(ty)?;
                collection.add_all(rows);
                Ok(Output::Collection(collection))
            }
            _ => Ok(Output::List(rows)),
        }
    }

    /// Wrap a single-row result in an optional; null is absent
    pub fn optional(&self, value: Option<Value>) -> Output {
        Output::Optional(value.filter(|v| !v.is_null()))
    }

    /// Fail when a null result would land in a primitive return type.
    pub fn check_null_into_primitive(&self, output: &Output, command: &str) -> Result<()> {
        let is_null = matches!(output, Output::Value(Value::Null));
        let ty = self.signature.return_type();
        if is_null && ty.is_primitive() && self.signature.return_kind() != ReturnKind::Void {
            return Err(Error::NullIntoPrimitive {
                command: command.to_string(),
                return_type: ty.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn unsupported_return_type(ty: &TypeDesc) -> Error {
    Error::binding(format!("unsupported return type: {}", ty))
}

fn to_primitive(kind: PrimitiveKind, value: Value) -> Result<Value> {
    let converted = match kind {
        PrimitiveKind::Bool => value.as_bool().map(Value::Bool),
        k if k.is_integral() => value.as_int().map(Value::Int),
        PrimitiveKind::Float | PrimitiveKind::Double => value
            .as_float()
            .or_else(|| value.as_int().map(|i| i as f64))
            .map(Value::Float),
        PrimitiveKind::Char => value
            .as_str()
            .filter(|s| s.chars().count() == 1)
            .map(|s| Value::String(s.to_string())),
        _ => None,
    };
    converted.ok_or_else(|| Error::Coercion {
        reason: format!("cannot store {} in a {}[] element", value.type_name(), kind.name()),
    })
}
