//! # Bindery Executor
//!
//! Runs registered commands against a database:
//! - [`driver`] - the traits a database driver implements
//! - [`Transaction`] - connection holder with commit/rollback
//! - [`Executor`] - simple, reuse and batch statement strategies plus the
//!   per-session query cache
//! - [`SqlSession`] / [`DefaultSession`] - the command-level API
//! - [`SessionFactory`] - opens sessions over a [`DataSource`]
//! - [`Cursor`] - lazily read query results
//!
//! ## Quick Start
//!
//! ```text
//! let factory = SessionFactory::new(config, Arc::new(SqliteDataSource::memory()?));
//! let mut session = factory.open_session()?;
//! let users = session.select_list("UserMapper.findAll", &mut Parameter::None, RowBounds::DEFAULT)?;
//! ```

#![warn(clippy::all)]

mod cursor;
pub mod driver;
mod executor;
mod factory;
mod result;
mod session;
mod statement;
pub mod testing;
mod transaction;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use cursor::Cursor;
pub use driver::{Connection, DataSource, Statement};
pub use executor::{Executor, BATCH_UPDATE_RETURN_VALUE};
pub use factory::SessionFactory;
pub use session::{DefaultSession, SqlSession};
pub use transaction::{ConnectionTransaction, Transaction};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDataSource;
