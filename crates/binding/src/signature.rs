//! Analysis of a method's declared signature, done once at bind time.

use bindery_core::{Configuration, Error, Result, RowBounds, TypeDesc};

use crate::binder::Arg;
use crate::contract::{Contract, MethodDecl, ParamKind};
use crate::param_names::ParamNameResolver;
use crate::resolver::CommandResolver;

/// Shape of a method's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// Nothing is returned
    Void,
    /// A list, array or declared collection
    Many,
    /// Rows grouped by a key property
    Map,
    /// Lazily read rows
    Cursor,
    /// A single optional row
    Optional,
    /// A single row or value
    Scalar,
}

/// Immutable description of one method's signature
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureDescriptor {
    return_kind: ReturnKind,
    return_type: TypeDesc,
    map_key: Option<String>,
    row_bounds_index: Option<usize>,
    row_handler_index: Option<usize>,
    arity: usize,
    param_names: ParamNameResolver,
}

impl SignatureDescriptor {
    /// Analyze `method` as invoked through `contract`.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when more than one parameter carries pagination or
    /// more than one carries a row callback.
    pub fn new(config: &Configuration, contract: &Contract, declaring: &Contract, method: &MethodDecl) -> Result<Self> {
        let return_type = CommandResolver::resolve_return_type(contract, method, declaring);
        let return_kind = return_kind_of(config, &return_type, method.map_key_name().is_some());
        let map_key = match return_kind {
            ReturnKind::Map => method.map_key_name().map(str::to_string),
            _ => None,
        };

        Ok(Self {
            return_kind,
            return_type,
            map_key,
            row_bounds_index: unique_index(method, ParamKind::RowBounds, "RowBounds")?,
            row_handler_index: unique_index(method, ParamKind::RowHandler, "RowHandler")?,
            arity: method.params().len(),
            param_names: ParamNameResolver::new(method, config.settings().use_actual_param_name),
        })
    }

    /// Result shape
    pub fn return_kind(&self) -> ReturnKind {
        self.return_kind
    }

    /// Resolved return type
    pub fn return_type(&self) -> &TypeDesc {
        &self.return_type
    }

    /// Grouping key of map results
    pub fn map_key(&self) -> Option<&str> {
        self.map_key.as_deref()
    }

    /// Position of the pagination argument
    pub fn row_bounds_index(&self) -> Option<usize> {
        self.row_bounds_index
    }

    /// Position of the row-callback argument
    pub fn row_handler_index(&self) -> Option<usize> {
        self.row_handler_index
    }

    /// Whether a row-callback argument is declared
    pub fn has_row_handler(&self) -> bool {
        self.row_handler_index.is_some()
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Parameter naming for this method
    pub fn param_names(&self) -> &ParamNameResolver {
        &self.param_names
    }

    /// Pagination of a call; [`RowBounds::DEFAULT`] without a bounds argument
    pub fn row_bounds(&self, args: &[Arg<'_>]) -> RowBounds {
        match self.row_bounds_index.and_then(|i| args.get(i)) {
            Some(Arg::Bounds(bounds)) => *bounds,
            _ => RowBounds::DEFAULT,
        }
    }
}

fn return_kind_of(config: &Configuration, ty: &TypeDesc, has_map_key: bool) -> ReturnKind {
    match ty {
        TypeDesc::Void => ReturnKind::Void,
        ty if config.object_factory().is_collection(ty) => ReturnKind::Many,
        TypeDesc::Array(_) => ReturnKind::Many,
        TypeDesc::Cursor(_) => ReturnKind::Cursor,
        TypeDesc::Optional(_) => ReturnKind::Optional,
        TypeDesc::Map(..) if has_map_key => ReturnKind::Map,
        _ => ReturnKind::Scalar,
    }
}

fn unique_index(method: &MethodDecl, kind: ParamKind, type_name: &str) -> Result<Option<usize>> {
    let mut found = None;
    for (index, param) in method.params().iter().enumerate() {
        if *param.kind() != kind {
            continue;
        }
        if found.is_some() {
            return Err(Error::binding(format!(
                "{} cannot have multiple {} parameters",
                method.name(),
                type_name
            )));
        }
        found = Some(index);
    }
    Ok(found)
}
