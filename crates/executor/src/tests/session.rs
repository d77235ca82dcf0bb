//! Session tests: result shapes, dirty tracking, commit/rollback/close.

use bindery_core::{CommandKind, Error, ExecutorType, MappedCommand, Parameter, RowBounds, Value};

use super::*;
use crate::testing::{Event, Response};
use crate::SqlSession;

// =============================================================================
// Result shapes
// =============================================================================

#[test]
fn test_select_one_zero_one_many() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();

    let one = session.select_one("UserMapper.findById", &mut Parameter::from(Value::from("u1"))).unwrap();
    assert_eq!(one.unwrap().property("name"), Some(&Value::from("user 1")));

    driver.respond(FIND_BY_ID, user_rows(0));
    session.clear_cache();
    let none = session.select_one("UserMapper.findById", &mut Parameter::from(Value::from("u1"))).unwrap();
    assert!(none.is_none());

    let many = session.select_one("UserMapper.findAll", &mut Parameter::None);
    assert_eq!(many, Err(Error::TooManyResults { found: 3 }));
}

#[test]
fn test_select_map_groups_by_key_and_replaces_duplicates() {
    let driver = user_driver();
    driver.respond(
        FIND_ALL,
        Response::rows(
            &["id", "name"],
            vec![
                vec![Value::from("u1"), Value::from("first")],
                vec![Value::from("u2"), Value::from("second")],
                vec![Value::from("u1"), Value::from("third")],
            ],
        ),
    );
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();

    let map = session
        .select_map("UserMapper.findAll", &mut Parameter::None, "id", RowBounds::DEFAULT)
        .unwrap();
    assert_eq!(map.len(), 2);
    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys, vec![Value::from("u1"), Value::from("u2")]);
    assert_eq!(
        map.get(&Value::from("u1")).and_then(|v| v.property("name")),
        Some(&Value::from("third"))
    );
}

#[test]
fn test_select_map_with_missing_key_property() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();

    let result = session.select_map("UserMapper.findAll", &mut Parameter::None, "email", RowBounds::DEFAULT);
    assert!(matches!(result, Err(Error::NoSuchProperty { ref property, .. }) if property == "email"));
}

#[test]
fn test_row_handler_can_stop_early() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();

    let mut names = Vec::new();
    let mut handler = |ctx: &mut bindery_core::ResultContext| {
        names.push(ctx.take_result());
        if ctx.result_count() == 2 {
            ctx.stop();
        }
    };
    session
        .select_with_handler("UserMapper.findAll", &mut Parameter::None, RowBounds::DEFAULT, &mut handler)
        .unwrap();

    assert_eq!(names.len(), 2);
    assert_eq!(driver.open_statements(), 0);
}

#[test]
fn test_lone_array_is_wrapped_as_list_and_collection() {
    let driver = user_driver();
    let config = user_commands()
        .command(
            MappedCommand::builder("UserMapper.byList", CommandKind::Select, "SELECT * FROM users WHERE id IN (#{list})")
                .unwrap()
                .build(),
        )
        .command(
            MappedCommand::builder(
                "UserMapper.byCollection",
                CommandKind::Select,
                "SELECT * FROM users WHERE name IN (#{collection})",
            )
            .unwrap()
            .build(),
        );
    let factory = factory(config, &driver);
    let mut session = factory.open_session().unwrap();

    let ids = Value::Array(vec![Value::from("u1"), Value::from("u2")]);
    let mut param = Parameter::from(ids.clone());
    session.select_list("UserMapper.byList", &mut param, RowBounds::DEFAULT).unwrap();
    session.select_list("UserMapper.byCollection", &mut param, RowBounds::DEFAULT).unwrap();

    let bound: Vec<_> = driver
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Bound { .. }))
        .collect();
    assert_eq!(
        bound,
        vec![
            Event::Bound { index: 1, value: ids.clone() },
            Event::Bound { index: 1, value: ids.clone() },
        ]
    );
    assert_eq!(param, Parameter::from(ids));
}

// =============================================================================
// Commit / rollback / close
// =============================================================================

fn commits(driver: &crate::testing::ScriptedDataSource) -> usize {
    driver.events().iter().filter(|e| **e == Event::Committed).count()
}

#[test]
fn test_commit_reaches_transaction_only_when_dirty_or_forced() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();

    session.select_list("UserMapper.findAll", &mut Parameter::None, RowBounds::DEFAULT).unwrap();
    session.commit(false).unwrap();
    assert_eq!(commits(&driver), 0);

    session.delete("UserMapper.deleteById", &mut Parameter::from(Value::from("u1"))).unwrap();
    assert!(session.is_dirty());
    session.commit(false).unwrap();
    assert_eq!(commits(&driver), 1);
    assert!(!session.is_dirty());

    session.commit(true).unwrap();
    assert_eq!(commits(&driver), 2);
}

#[test]
fn test_auto_commit_session_skips_commit() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session_with(ExecutorType::Simple, true).unwrap();

    session.delete("UserMapper.deleteById", &mut Parameter::from(Value::from("u1"))).unwrap();
    session.commit(false).unwrap();
    assert_eq!(commits(&driver), 0);
    assert!(!driver.events().contains(&Event::AutoCommit(false)));
}

#[test]
fn test_commit_clears_local_cache() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();

    session.select_list("UserMapper.findAll", &mut Parameter::None, RowBounds::DEFAULT).unwrap();
    session.commit(true).unwrap();
    session.select_list("UserMapper.findAll", &mut Parameter::None, RowBounds::DEFAULT).unwrap();
    assert_eq!(count_executed(&driver, FIND_ALL), 2);
}

#[test]
fn test_drop_rolls_back_dirty_session() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    {
        let mut session = factory.open_session().unwrap();
        session.delete("UserMapper.deleteById", &mut Parameter::from(Value::from("u1"))).unwrap();
    }
    let events = driver.events();
    let rolled_back = events.iter().position(|e| *e == Event::RolledBack).unwrap();
    let closed = events.iter().position(|e| *e == Event::ConnectionClosed).unwrap();
    assert!(rolled_back < closed);
}

#[test]
fn test_clean_session_close_skips_rollback() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory.open_session().unwrap();
    session.select_list("UserMapper.findAll", &mut Parameter::None, RowBounds::DEFAULT).unwrap();
    session.close();

    let events = driver.events();
    assert!(!events.contains(&Event::RolledBack));
    assert!(events.contains(&Event::ConnectionClosed));
}

#[test]
fn test_session_with_caller_connection() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let mut session = factory
        .open_session_with_connection(ExecutorType::Simple, driver.connection(false))
        .unwrap();

    session.delete("UserMapper.deleteById", &mut Parameter::from(Value::from("u1"))).unwrap();
    session.commit(false).unwrap();
    assert_eq!(commits(&driver), 1);
}

#[test]
fn test_connection_opened_lazily() {
    let driver = user_driver();
    let factory = factory(user_commands(), &driver);
    let session = factory.open_session().unwrap();
    assert!(driver.events().is_empty());
    drop(session);
    assert!(!driver.events().contains(&Event::Connected));
}
