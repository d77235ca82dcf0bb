//! Contract calls against SQLite.

use bindery::{Arg, Error, Output, RowBounds, Value};

use crate::common::*;

#[test]
fn test_delete_by_id_returns_one() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    let out = mapper.call("delete", &mut [Arg::Value(Value::from("u2"))]).unwrap();
    assert_eq!(out.as_int(), Some(1));

    let out = mapper.call("delete", &mut [Arg::Value(Value::from("u2"))]).unwrap();
    assert_eq!(out.as_int(), Some(0));
}

#[test]
fn test_find_all_returns_rows_in_order_without_conversion() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    match mapper.call("findAll", &mut []).unwrap() {
        Output::List(rows) => assert_eq!(
            rows,
            vec![
                user("u1", "Ada", Some(36)),
                user("u2", "Grace", Some(45)),
                user("u3", "Linus", None),
            ]
        ),
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn test_optional_lookup() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    let found = mapper.call("findById", &mut [Arg::Value(Value::from("u1"))]).unwrap();
    assert!(matches!(found, Output::Optional(Some(ref u)) if *u == user("u1", "Ada", Some(36))));

    let missing = mapper.call("findById", &mut [Arg::Value(Value::from("nobody"))]).unwrap();
    assert!(matches!(missing, Output::Optional(None)));
}

#[test]
fn test_grouped_map_cursor_and_page() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    let Output::Map(by_id) = mapper.call("byId", &mut []).unwrap() else {
        panic!("expected a map");
    };
    assert_eq!(by_id.get(&Value::from("u3")), Some(&user("u3", "Linus", None)));

    let Output::Cursor(cursor) = mapper.call("stream", &mut []).unwrap() else {
        panic!("expected a cursor");
    };
    let names: Vec<_> = cursor
        .map(|row| row.unwrap().property("name").cloned().unwrap())
        .collect();
    assert_eq!(names, vec![Value::from("Ada"), Value::from("Grace"), Value::from("Linus")]);

    let page = mapper
        .call("page", &mut [Arg::Bounds(RowBounds::new(1, 5))])
        .unwrap()
        .into_items()
        .unwrap();
    assert_eq!(page.len(), 2);
}

#[test]
fn test_scalars_arrays_and_null_into_primitive() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    assert_eq!(mapper.call("count", &mut []).unwrap().into_value(), Some(Value::Int(3)));

    let Output::Array(ages) = mapper.call("ages", &mut []).unwrap() else {
        panic!("expected an array");
    };
    assert_eq!(ages, vec![Value::Int(36), Value::Int(45)]);

    let err = mapper.call("ageOf", &mut [Arg::Value(Value::from("u3"))]).unwrap_err();
    assert_eq!(
        err,
        Error::NullIntoPrimitive {
            command: "app.UserMapper.ageOf".into(),
            return_type: "int".into()
        }
    );
}

#[test]
fn test_aliased_parameters_and_boolean_count() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    let renamed = mapper
        .call("rename", &mut [Arg::Value(Value::from("u1")), Arg::Value(Value::from("Augusta"))])
        .unwrap();
    assert_eq!(renamed.as_bool(), Some(true));

    let missing = mapper
        .call("rename", &mut [Arg::Value(Value::from("u9")), Arg::Value(Value::from("x"))])
        .unwrap();
    assert_eq!(missing.as_bool(), Some(false));
}

#[test]
fn test_generated_key_written_back_to_argument() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut notes = registry.mapper("app.NoteMapper", &mut session).unwrap();

    let mut first = [Arg::Value(Value::object([("body", "first")]))];
    let mut second = [Arg::Value(Value::object([("body", "second")]))];
    assert!(notes.call("add", &mut first).unwrap().is_unit());
    assert!(notes.call("add", &mut second).unwrap().is_unit());

    assert_eq!(first[0].value().and_then(|v| v.property("id")), Some(&Value::Int(1)));
    assert_eq!(second[0].value().and_then(|v| v.property("id")), Some(&Value::Int(2)));
}

#[test]
fn test_driver_error_surfaces_and_statement_is_released() {
    let (_source, factory, registry) = setup(commands().build().unwrap());
    let mut session = factory.open_session().unwrap();
    let mut mapper = registry.mapper(USER_MAPPER, &mut session).unwrap();

    let duplicate = user("u1", "Again", None);
    let err = mapper.call("insert", &mut [Arg::Value(duplicate)]).unwrap_err();
    assert!(matches!(err, Error::Statement { .. }), "got {:?}", err);

    assert_eq!(mapper.call("count", &mut []).unwrap().into_value(), Some(Value::Int(3)));
}
