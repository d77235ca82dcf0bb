//! Shared fixtures: a seeded SQLite database and the `UserMapper` contract.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use bindery::{
    Configuration, ConfigurationBuilder, Contract, MapperRegistry, MethodDecl, PrimitiveKind, SessionFactory,
    SqliteDataSource, TypeDesc, Value,
};

pub const USER_MAPPER: &str = "app.UserMapper";

pub const SCHEMA: &str = "
    CREATE TABLE users (id TEXT PRIMARY KEY, name TEXT NOT NULL, age INTEGER);
    INSERT INTO users (id, name, age) VALUES ('u1', 'Ada', 36), ('u2', 'Grace', 45), ('u3', 'Linus', NULL);
    CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL);
";

pub const COMMANDS: &str = r#"
[settings]
default_executor_type = "simple"

[[command]]
id = "app.UserMapper.findAll"
kind = "select"
sql = "SELECT id, name, age FROM users ORDER BY id"
result_type = "User"

[[command]]
id = "app.UserMapper.findById"
kind = "select"
sql = "SELECT id, name, age FROM users WHERE id = #{id}"
result_type = "User"

[[command]]
id = "app.UserMapper.byId"
kind = "select"
sql = "SELECT id, name, age FROM users ORDER BY id"
result_type = "User"

[[command]]
id = "app.UserMapper.stream"
kind = "select"
sql = "SELECT id, name, age FROM users ORDER BY id"
result_type = "User"

[[command]]
id = "app.UserMapper.page"
kind = "select"
sql = "SELECT id, name, age FROM users ORDER BY id"
result_type = "User"

[[command]]
id = "app.UserMapper.ageOf"
kind = "select"
sql = "SELECT age FROM users WHERE id = #{id}"
result_type = "int"

[[command]]
id = "app.UserMapper.ages"
kind = "select"
sql = "SELECT age FROM users WHERE age IS NOT NULL ORDER BY id"
result_type = "int"

[[command]]
id = "app.UserMapper.count"
kind = "select"
sql = "SELECT COUNT(*) FROM users"
result_type = "long"

[[command]]
id = "app.UserMapper.insert"
kind = "insert"
sql = "INSERT INTO users (id, name, age) VALUES (#{id}, #{name}, #{age})"

[[command]]
id = "app.UserMapper.rename"
kind = "update"
sql = "UPDATE users SET name = #{name} WHERE id = #{id}"

[[command]]
id = "app.UserMapper.delete"
kind = "delete"
sql = "DELETE FROM users WHERE id = #{id}"

[[command]]
id = "app.NoteMapper.add"
kind = "insert"
sql = "INSERT INTO notes (body) VALUES (#{body})"
key_generator = { type = "generated", key_properties = ["id"] }
"#;

static TRACING: Once = Once::new();

/// Route library logs to the test harness
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn seeded_database() -> SqliteDataSource {
    let source = SqliteDataSource::memory().unwrap();
    source.execute_script(SCHEMA).unwrap();
    source
}

pub fn user_contract() -> Arc<Contract> {
    let user = || TypeDesc::named("User");
    let int = TypeDesc::Primitive(PrimitiveKind::Int);
    Contract::builder(USER_MAPPER)
        .method(MethodDecl::new("findAll", TypeDesc::list(user())))
        .method(MethodDecl::new("findById", TypeDesc::optional(user())).param("id", TypeDesc::String))
        .method(MethodDecl::new("byId", TypeDesc::map(TypeDesc::String, user())).map_key("id"))
        .method(MethodDecl::new("stream", TypeDesc::cursor(user())))
        .method(MethodDecl::new("page", TypeDesc::list(user())).row_bounds("bounds"))
        .method(MethodDecl::new("ageOf", int.clone()).param("id", TypeDesc::String))
        .method(MethodDecl::new("ages", TypeDesc::array(int.clone())))
        .method(MethodDecl::new("count", TypeDesc::Boxed(PrimitiveKind::Long)))
        .method(MethodDecl::new("insert", int.clone()).param("user", user()))
        .method(
            MethodDecl::new("rename", TypeDesc::Primitive(PrimitiveKind::Bool))
                .aliased_param("id", "userId", TypeDesc::String)
                .aliased_param("name", "newName", TypeDesc::String),
        )
        .method(MethodDecl::new("delete", int).param("id", TypeDesc::String))
        .method(MethodDecl::new("flush", TypeDesc::list(TypeDesc::Any)).flush())
        .build()
}

pub fn note_contract() -> Arc<Contract> {
    Contract::builder("app.NoteMapper")
        .method(MethodDecl::new("add", TypeDesc::Void).param("note", TypeDesc::named("Note")))
        .build()
}

pub fn commands() -> ConfigurationBuilder {
    ConfigurationBuilder::from_toml_str(COMMANDS).unwrap()
}

/// Factory over a seeded database plus a registry holding both contracts
pub fn setup(config: Configuration) -> (SqliteDataSource, SessionFactory, MapperRegistry) {
    init_tracing();
    let source = seeded_database();
    let factory = SessionFactory::new(config, Arc::new(source.clone()));
    let mut registry = MapperRegistry::new(Arc::clone(factory.configuration()));
    registry.add_contract(user_contract()).unwrap();
    registry.add_contract(note_contract()).unwrap();
    (source, factory, registry)
}

pub fn user(id: &str, name: &str, age: Option<i64>) -> Value {
    Value::object([
        ("id", Value::from(id)),
        ("name", Value::from(name)),
        ("age", age.map(Value::Int).unwrap_or(Value::Null)),
    ])
}
