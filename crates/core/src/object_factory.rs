//! Creation of declared collection types.
//!
//! List queries always produce a `Vec`. When a contract declares another
//! collection shape, the binder asks the configured [`ObjectFactory`] whether
//! the type is collection-like and to build an empty instance of it.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::{CollectionKind, TypeDesc};
use crate::value::Value;

/// An instance of a declared collection type.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredCollection {
    kind: CollectionKind,
    items: Vec<Value>,
}

impl DeclaredCollection {
    /// An empty collection of `kind`
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Append an element; sets keep only the first of equal elements
    pub fn add(&mut self, item: Value) {
        if self.kind == CollectionKind::Set && self.items.contains(&item) {
            return;
        }
        self.items.push(item);
    }

    /// Append every element in order
    pub fn add_all(&mut self, items: impl IntoIterator<Item = Value>) {
        for item in items {
            self.add(item);
        }
    }

    /// Declared kind
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Elements in insertion order
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Consume into the elements
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Knows which declared types are collections and how to create them.
pub trait ObjectFactory: Send + Sync + fmt::Debug {
    /// Whether `ty` is a collection-like shape
    fn is_collection(&self, ty: &TypeDesc) -> bool;

    /// Create an empty instance of the collection type `ty`
    fn create_collection(&self, ty: &TypeDesc) -> Result<DeclaredCollection>;
}

/// Factory covering every [`CollectionKind`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultObjectFactory;

impl ObjectFactory for DefaultObjectFactory {
    fn is_collection(&self, ty: &TypeDesc) -> bool {
        matches!(ty, TypeDesc::Collection(..))
    }

    fn create_collection(&self, ty: &TypeDesc) -> Result<DeclaredCollection> {
        match ty {
            TypeDesc::Collection(kind, _) => Ok(DeclaredCollection::new(*kind)),
            other => Err(Error::Coercion {
                reason: format!("cannot create a collection instance of type {}", other),
            }),
        }
    }
}
