//! Declared data-access contracts.
//!
//! A [`Contract`] is the explicit description of a mapper interface: its
//! fully qualified name, its type parameters, the parent contracts it
//! extends (with the type arguments it supplies them) and its method
//! declarations. Contracts are built once and shared behind `Arc`.

use std::sync::Arc;

use bindery_core::TypeDesc;

/// How a declared parameter takes part in a call
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// A value packed into the parameter object
    Value(TypeDesc),
    /// Logical pagination (`RowBounds`)
    RowBounds,
    /// Per-row callback (`RowHandler`)
    RowHandler,
}

/// One declared method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    name: String,
    alias: Option<String>,
    kind: ParamKind,
}

impl ParamDecl {
    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicit alias, if any
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Parameter kind
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

/// A method declared on a contract.
///
/// ```
/// use bindery_binding::MethodDecl;
/// use bindery_core::{PrimitiveKind, TypeDesc};
///
/// let delete = MethodDecl::new("delete", TypeDesc::Primitive(PrimitiveKind::Int))
///     .param("id", TypeDesc::String);
/// assert_eq!(delete.params().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    name: String,
    return_type: TypeDesc,
    params: Vec<ParamDecl>,
    map_key: Option<String>,
    flush: bool,
}

impl MethodDecl {
    /// A method with no parameters
    pub fn new(name: impl Into<String>, return_type: TypeDesc) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            map_key: None,
            flush: false,
        }
    }

    /// Append a value parameter
    pub fn param(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.push(name.into(), None, ParamKind::Value(ty))
    }

    /// Append a value parameter with an explicit alias
    pub fn aliased_param(self, alias: impl Into<String>, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.push(name.into(), Some(alias.into()), ParamKind::Value(ty))
    }

    /// Append a pagination parameter
    pub fn row_bounds(self, name: impl Into<String>) -> Self {
        self.push(name.into(), None, ParamKind::RowBounds)
    }

    /// Append a row-callback parameter
    pub fn row_handler(self, name: impl Into<String>) -> Self {
        self.push(name.into(), None, ParamKind::RowHandler)
    }

    /// Group map-shaped results by this property
    pub fn map_key(mut self, key: impl Into<String>) -> Self {
        self.map_key = Some(key.into());
        self
    }

    /// Tag the method as a flush of pending batch statements
    pub fn flush(mut self) -> Self {
        self.flush = true;
        self
    }

    fn push(mut self, name: String, alias: Option<String>, kind: ParamKind) -> Self {
        self.params.push(ParamDecl { name, alias, kind });
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared return type, possibly referring to type parameters
    pub fn return_type(&self) -> &TypeDesc {
        &self.return_type
    }

    /// Declared parameters in order
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// Grouping key for map results
    pub fn map_key_name(&self) -> Option<&str> {
        self.map_key.as_deref()
    }

    /// Whether the method is tagged as a flush
    pub fn is_flush(&self) -> bool {
        self.flush
    }
}

/// A parent contract together with the type arguments supplied to it
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    /// The extended contract
    pub contract: Arc<Contract>,
    /// Type arguments, positionally matching the parent's type parameters
    pub type_args: Vec<TypeDesc>,
}

/// A declared data-access contract
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    name: String,
    type_params: Vec<String>,
    parents: Vec<ParentRef>,
    methods: Vec<MethodDecl>,
}

impl Contract {
    /// Start describing the contract `name` (fully qualified)
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            contract: Contract {
                name: name.into(),
                type_params: Vec::new(),
                parents: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    /// Fully qualified name; the prefix of every command id
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type parameters
    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    /// Directly extended contracts in declaration order
    pub fn parents(&self) -> &[ParentRef] {
        &self.parents
    }

    /// Methods declared on this contract itself
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// True when `self` is `other` or extends it, directly or not
    pub fn is_subtype_of(&self, other: &Contract) -> bool {
        self.name == other.name || self.parents.iter().any(|p| p.contract.is_subtype_of(other))
    }

    /// Every method callable through this contract with the contract that
    /// declares it.
    ///
    /// Own methods come first, then inherited ones depth-first in parent
    /// order. A name seen earlier shadows later declarations.
    pub fn visible_methods(&self) -> Vec<(&Contract, &MethodDecl)> {
        let mut visible: Vec<(&Contract, &MethodDecl)> = Vec::new();
        self.collect_methods(&mut visible);
        visible
    }

    fn collect_methods<'a>(&'a self, out: &mut Vec<(&'a Contract, &'a MethodDecl)>) {
        for method in &self.methods {
            if !out.iter().any(|(_, m)| m.name == method.name) {
                out.push((self, method));
            }
        }
        for parent in &self.parents {
            parent.contract.collect_methods(out);
        }
    }

    /// Extension path from `self` down to `ancestor`, first match depth-first.
    ///
    /// Empty when `ancestor` is `self`; `None` when it is not an ancestor.
    pub(crate) fn path_to(&self, ancestor: &Contract) -> Option<Vec<&ParentRef>> {
        if self.name == ancestor.name {
            return Some(Vec::new());
        }
        self.parents.iter().find_map(|parent| {
            parent.contract.path_to(ancestor).map(|mut rest| {
                rest.insert(0, parent);
                rest
            })
        })
    }
}

/// Builder for [`Contract`]
#[derive(Debug)]
pub struct ContractBuilder {
    contract: Contract,
}

impl ContractBuilder {
    /// Declare type parameters
    pub fn type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contract.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Extend `parent`, supplying `type_args` for its type parameters
    pub fn extends(mut self, parent: Arc<Contract>, type_args: Vec<TypeDesc>) -> Self {
        self.contract.parents.push(ParentRef {
            contract: parent,
            type_args,
        });
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.contract.methods.push(method);
        self
    }

    /// Finish the contract
    pub fn build(self) -> Arc<Contract> {
        Arc::new(self.contract)
    }
}
