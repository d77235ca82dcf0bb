//! Session lifecycle and executor types against SQLite.

use bindery::{Arg, Error, ExecutorType, Output, SqlSession, Value, BATCH_UPDATE_RETURN_VALUE};

use crate::common::*;

fn count(factory: &bindery::SessionFactory, registry: &bindery::MapperRegistry) -> Value {
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
    mapper.call("count", &mut []).unwrap().into_value().unwrap()
}

fn new_user(id: &str) -> Arg<'static> {
    Arg::Value(user(id, "New", Some(20)))
}

#[test]
fn test_commit_makes_changes_visible_to_later_sessions() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    {
        let mut session = factory.open_session().unwrap();
        let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
        mapper.call("delete", &mut [Arg::Value(Value::from("u1"))]).unwrap();
        session.commit(false).unwrap();
    }
    assert_eq!(count(&factory, &registry), Value::Int(2));
}

#[test]
fn test_rollback_discards_changes_and_cache() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    {
        let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
        mapper.call("delete", &mut [Arg::Value(Value::from("u1"))]).unwrap();
        assert_eq!(mapper.call("count", &mut []).unwrap().into_value(), Some(Value::Int(2)));
    }
    session.rollback(false).unwrap();

    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
    assert_eq!(mapper.call("count", &mut []).unwrap().into_value(), Some(Value::Int(3)));
}

#[test]
fn test_dropped_session_rolls_back() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    {
        let mut session = factory.open_session().unwrap();
        let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
        mapper.call("insert", &mut [new_user("u4")]).unwrap();
    }
    assert_eq!(count(&factory, &registry), Value::Int(3));
}

#[test]
fn test_auto_commit_session_needs_no_commit() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    {
        let mut session = factory.open_session_with(ExecutorType::Simple, true).unwrap();
        let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
        mapper.call("delete", &mut [Arg::Value(Value::from("u3"))]).unwrap();
    }
    assert_eq!(count(&factory, &registry), Value::Int(2));
}

#[test]
fn test_batch_session_flushes_through_the_contract() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    {
        let mut session = factory.open_session_with(ExecutorType::Batch, false).unwrap();
        let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
        for id in ["u4", "u5"] {
            let out = mapper.call("insert", &mut [new_user(id)]).unwrap();
            assert_eq!(out.as_int(), Some(BATCH_UPDATE_RETURN_VALUE));
        }

        let Output::Batch(results) = mapper.call("flush", &mut []).unwrap() else {
            panic!("expected batch results");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].command_id, "app.UserMapper.insert");
        assert_eq!(results[0].update_counts, vec![1, 1]);
        session.commit(false).unwrap();
    }
    assert_eq!(count(&factory, &registry), Value::Int(5));
}

#[test]
fn test_batch_failure_reports_how_far_it_got() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session_with(ExecutorType::Batch, false).unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    mapper.call("delete", &mut [Arg::Value(Value::from("u2"))]).unwrap();
    for id in ["u4", "u1", "u5"] {
        mapper.call("insert", &mut [new_user(id)]).unwrap();
    }

    match mapper.call("flush", &mut []) {
        Err(Error::PartialBatch {
            statement_index,
            command_id,
            update_counts,
            successful,
            ..
        }) => {
            assert_eq!(statement_index, 1);
            assert_eq!(command_id, "app.UserMapper.insert");
            assert_eq!(update_counts, vec![1]);
            assert_eq!(successful.len(), 1);
            assert_eq!(successful[0].update_counts, vec![1]);
        }
        other => panic!("expected a partial batch failure, got {:?}", other),
    }
}

#[test]
fn test_reuse_session_answers_repeated_queries() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session_with(ExecutorType::Reuse, false).unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    for (id, name) in [("u1", "Ada"), ("u2", "Grace"), ("u1", "Ada")] {
        let Output::Optional(Some(found)) = mapper.call("findById", &mut [Arg::Value(Value::from(id))]).unwrap() else {
            panic!("expected {} to be found", id);
        };
        assert_eq!(found.property("name"), Some(&Value::from(name)));
    }
    mapper.call("delete", &mut [Arg::Value(Value::from("u1"))]).unwrap();
    let gone = mapper.call("findById", &mut [Arg::Value(Value::from("u1"))]).unwrap();
    assert!(matches!(gone, Output::Optional(None)));
}

#[test]
fn test_closed_session_refuses_calls() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    session.close();

    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();
    let err = mapper.call("count", &mut []).unwrap_err();
    assert_eq!(err, Error::executor("executor was closed"));
}
