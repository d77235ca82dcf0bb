//! Scenario tests for the executor crate, run against the scripted driver.

pub mod session;

use std::sync::Arc;

use bindery_core::{CommandKind, Configuration, ConfigurationBuilder, MappedCommand, ParamMap, Parameter, Value};

use crate::testing::{Event, Response, ScriptedDataSource};
use crate::SessionFactory;

pub(crate) const FIND_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
pub(crate) const FIND_ALL: &str = "SELECT * FROM users";
pub(crate) const INSERT: &str = "INSERT INTO users (id, name) VALUES (?, ?)";
pub(crate) const DELETE: &str = "DELETE FROM users WHERE id = ?";

/// Builder preloaded with the `UserMapper` commands
pub(crate) fn user_commands() -> ConfigurationBuilder {
    Configuration::builder()
        .command(
            MappedCommand::builder("UserMapper.findById", CommandKind::Select, "SELECT * FROM users WHERE id = #{id}")
                .unwrap()
                .result_type("User")
                .build(),
        )
        .command(
            MappedCommand::builder("UserMapper.findAll", CommandKind::Select, "SELECT * FROM users")
                .unwrap()
                .result_type("User")
                .build(),
        )
        .command(
            MappedCommand::builder(
                "UserMapper.insert",
                CommandKind::Insert,
                "INSERT INTO users (id, name) VALUES (#{id}, #{name})",
            )
            .unwrap()
            .build(),
        )
        .command(
            MappedCommand::builder("UserMapper.deleteById", CommandKind::Delete, "DELETE FROM users WHERE id = #{id}")
                .unwrap()
                .build(),
        )
}

/// Scripted driver answering the `UserMapper` SQL
pub(crate) fn user_driver() -> ScriptedDataSource {
    let driver = ScriptedDataSource::new();
    driver.respond(FIND_ALL, user_rows(3));
    driver.respond(FIND_BY_ID, user_rows(1));
    driver.respond(INSERT, Response::update_count(1));
    driver.respond(DELETE, Response::update_count(1));
    driver
}

pub(crate) fn user_rows(count: usize) -> Response {
    let rows = (1..=count)
        .map(|i| vec![Value::String(format!("u{}", i)), Value::String(format!("user {}", i))])
        .collect();
    Response::rows(&["id", "name"], rows)
}

pub(crate) fn factory(config: ConfigurationBuilder, driver: &ScriptedDataSource) -> SessionFactory {
    SessionFactory::new(config.build().unwrap(), Arc::new(driver.clone()))
}

pub(crate) fn named(pairs: &[(&str, Value)]) -> Parameter {
    let mut map = ParamMap::new();
    for (name, value) in pairs {
        map.insert(*name, value.clone());
    }
    Parameter::Named(map)
}

pub(crate) fn count_executed(driver: &ScriptedDataSource, sql: &str) -> usize {
    driver
        .events()
        .iter()
        .filter(|e| matches!(e, Event::Executed { sql: s } if s == sql))
        .count()
}

pub(crate) fn count_prepared(driver: &ScriptedDataSource) -> usize {
    driver
        .events()
        .iter()
        .filter(|e| matches!(e, Event::Prepared { .. }))
        .count()
}
