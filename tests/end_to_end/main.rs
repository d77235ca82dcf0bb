//! End-to-end tests
//!
//! Contracts bound through a `MapperRegistry` and run against SQLite:
//! - mapper: every result shape and row-count coercion
//! - sessions: executor types, commit and rollback
//! - config: `bindery.toml` loading

mod common;

mod config;
mod mapper;
mod sessions;
