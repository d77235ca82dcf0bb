//! Declared type descriptors.
//!
//! Contracts describe their return and parameter types with [`TypeDesc`]
//! values written by hand at contract-definition time. Nothing here is
//! discovered at runtime; generic parameters are substituted explicitly when
//! a method is bound (see `bindery-binding`).

use std::fmt;

/// Primitive (non-nullable) scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl PrimitiveKind {
    /// Lower-case name used in error messages (`int`, `long`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Char => "char",
        }
    }

    /// True for the integral kinds
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int | PrimitiveKind::Long
        )
    }
}

/// Collection shapes the default object factory knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Any iterable sequence
    Iterable,
    /// Any collection
    Collection,
    /// Ordered list; what list queries produce natively
    List,
    /// Insertion-ordered set; equal elements are kept once
    Set,
    /// Double-ended queue
    Deque,
}

impl CollectionKind {
    /// Whether a plain list is already an instance of this declared kind
    pub fn accepts_list(&self) -> bool {
        matches!(
            self,
            CollectionKind::Iterable | CollectionKind::Collection | CollectionKind::List
        )
    }

    fn name(&self) -> &'static str {
        match self {
            CollectionKind::Iterable => "Iterable",
            CollectionKind::Collection => "Collection",
            CollectionKind::List => "List",
            CollectionKind::Set => "Set",
            CollectionKind::Deque => "Deque",
        }
    }
}

/// A declared type in a contract signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// No return value
    Void,
    /// Non-nullable scalar (`int`, `boolean`...)
    Primitive(PrimitiveKind),
    /// Nullable wrapper of a scalar kind (`Integer`, `Boolean`...)
    Boxed(PrimitiveKind),
    /// Text
    String,
    /// Untyped value (what an unresolved type parameter erases to)
    Any,
    /// A named row type, e.g. `User`
    Named(String),
    /// Fixed array of elements
    Array(Box<TypeDesc>),
    /// Declared collection of elements
    Collection(CollectionKind, Box<TypeDesc>),
    /// Key/value map
    Map(Box<TypeDesc>, Box<TypeDesc>),
    /// Streaming, forward-only cursor over elements
    Cursor(Box<TypeDesc>),
    /// Optional wrapper
    Optional(Box<TypeDesc>),
    /// Reference to a type parameter of the declaring contract
    Param(String),
}

impl TypeDesc {
    /// `List<element>`
    pub fn list(element: TypeDesc) -> Self {
        TypeDesc::Collection(CollectionKind::List, Box::new(element))
    }

    /// `Set<element>`
    pub fn set(element: TypeDesc) -> Self {
        TypeDesc::Collection(CollectionKind::Set, Box::new(element))
    }

    /// `element[]`
    pub fn array(element: TypeDesc) -> Self {
        TypeDesc::Array(Box::new(element))
    }

    /// `Map<key, value>`
    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::Map(Box::new(key), Box::new(value))
    }

    /// `Cursor<element>`
    pub fn cursor(element: TypeDesc) -> Self {
        TypeDesc::Cursor(Box::new(element))
    }

    /// `Optional<inner>`
    pub fn optional(inner: TypeDesc) -> Self {
        TypeDesc::Optional(Box::new(inner))
    }

    /// A named row type
    pub fn named(name: impl Into<String>) -> Self {
        TypeDesc::Named(name.into())
    }

    /// A type parameter reference
    pub fn param(name: impl Into<String>) -> Self {
        TypeDesc::Param(name.into())
    }

    /// True for non-nullable scalar kinds
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDesc::Primitive(_))
    }

    /// The scalar kind behind a primitive or its wrapper
    pub fn scalar_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeDesc::Primitive(k) | TypeDesc::Boxed(k) => Some(*k),
            _ => None,
        }
    }

    /// Replace every `Param(name)` for which `lookup` answers.
    pub fn substitute(&self, lookup: &dyn Fn(&str) -> Option<TypeDesc>) -> TypeDesc {
        let sub = |t: &TypeDesc| Box::new(t.substitute(lookup));
        match self {
            TypeDesc::Param(name) => lookup(name).unwrap_or_else(|| self.clone()),
            TypeDesc::Array(e) => TypeDesc::Array(sub(e)),
            TypeDesc::Collection(kind, e) => TypeDesc::Collection(*kind, sub(e)),
            TypeDesc::Map(k, v) => TypeDesc::Map(sub(k), sub(v)),
            TypeDesc::Cursor(e) => TypeDesc::Cursor(sub(e)),
            TypeDesc::Optional(e) => TypeDesc::Optional(sub(e)),
            other => other.clone(),
        }
    }

    /// Replace every remaining type parameter with [`TypeDesc::Any`]
    pub fn erase_params(&self) -> TypeDesc {
        self.substitute(&|_| Some(TypeDesc::Any))
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Void => write!(f, "void"),
            TypeDesc::Primitive(k) => write!(f, "{}", k.name()),
            TypeDesc::Boxed(k) => {
                let name = k.name();
                write!(f, "{}{}", name[..1].to_uppercase(), &name[1..])
            }
            TypeDesc::String => write!(f, "String"),
            TypeDesc::Any => write!(f, "Object"),
            TypeDesc::Named(name) => write!(f, "{}", name),
            TypeDesc::Array(e) => write!(f, "{}[]", e),
            TypeDesc::Collection(kind, e) => write!(f, "{}<{}>", kind.name(), e),
            TypeDesc::Map(k, v) => write!(f, "Map<{}, {}>", k, v),
            TypeDesc::Cursor(e) => write!(f, "Cursor<{}>", e),
            TypeDesc::Optional(e) => write!(f, "Optional<{}>", e),
            TypeDesc::Param(name) => write!(f, "{}", name),
        }
    }
}
