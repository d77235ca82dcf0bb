//! Bindery - declared data-access contracts bound to SQL commands
//!
//! A contract describes mapper methods; a configuration registers the
//! commands they run. Binding a contract resolves each method to its
//! command once, and every call then packs its arguments, runs the
//! command on a session and shapes the result into the declared type.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use bindery::{Arg, Configuration, Contract, MapperRegistry, MethodDecl, SessionFactory, SqliteDataSource};
//!
//! let config = Configuration::builder().command(delete_command).build()?;
//! let factory = SessionFactory::new(config, Arc::new(SqliteDataSource::memory()?));
//!
//! let mut registry = MapperRegistry::new(Arc::clone(factory.configuration()));
//! registry.add_contract(user_mapper)?;
//!
//! let mut session = factory.open_session()?;
//! let deleted = registry
//!     .mapper("app.UserMapper", &mut session)?
//!     .call("delete", &mut [Arg::Value("u1".into())])?;
//! ```
//!
//! # Architecture
//!
//! - `bindery-core`: values, errors, commands, parameters, configuration
//! - `bindery-executor`: drivers, statements, executors, sessions
//! - `bindery-binding`: contracts, resolution, result shaping, mappers

pub use bindery_binding::*;
pub use bindery_core::*;
pub use bindery_executor::*;
