//! Core types for Bindery
//!
//! This crate defines the data model shared by the executor and binding layers:
//! - Value: Unified value enum for arguments, columns and results
//! - Error: Error type hierarchy
//! - TypeDesc: Declared return/parameter types of contract methods
//! - MappedCommand / CommandRegistry: compiled commands keyed by identifier
//! - SqlSource / BoundSql: compiled SQL templates
//! - Parameter / ParamMap: the packed parameter object of a call
//! - Row, RowBounds, RowHandler, ResultMap, BatchResult: result types
//! - ObjectFactory, RowMapper: pluggable collaborators
//! - Settings / ConfigurationBuilder / Configuration: `bindery.toml`

#![warn(clippy::all)]

pub mod command;
pub mod config;
pub mod error;
pub mod object_factory;
pub mod param;
pub mod registry;
pub mod result;
pub mod row_mapper;
pub mod sql;
pub mod types;
pub mod value;

pub use command::{CommandKind, KeyGenerator, MappedCommand, MappedCommandBuilder, StatementKind};
pub use config::{
    Configuration, ConfigurationBuilder, ExecutorType, LocalCacheScope, Settings, CONFIG_FILE_NAME,
};
pub use error::{Error, Result};
pub use object_factory::{DeclaredCollection, DefaultObjectFactory, ObjectFactory};
pub use param::{ParamMap, Parameter};
pub use registry::CommandRegistry;
pub use result::{BatchResult, ResultContext, ResultMap, Row, RowBounds, RowHandler};
pub use row_mapper::{DefaultRowMapper, RowMapper};
pub use sql::{BoundSql, ParameterMapping, ParameterMode, SqlSource, StaticSqlSource};
pub use types::{CollectionKind, PrimitiveKind, TypeDesc};
pub use value::Value;
