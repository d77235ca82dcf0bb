//! Binding scenarios, run through the scripted driver.


use std::sync::Arc;

use bindery_core::{
    CommandKind, Configuration, ConfigurationBuilder, KeyGenerator, MappedCommand, PrimitiveKind, TypeDesc, Value,
};
use bindery_executor::testing::{Response, ScriptedDataSource};
use bindery_executor::SessionFactory;

use crate::{Contract, MapperRegistry, MethodDecl};

pub(crate) const FIND_ALL: &str = "SELECT * FROM users";
pub(crate) const FIND_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
pub(crate) const FIND_IDS: &str = "SELECT id FROM users";
pub(crate) const COUNT: &str = "SELECT count(*) FROM users";
pub(crate) const DELETE: &str = "DELETE FROM users WHERE id = ?";
pub(crate) const DELETE_ALL: &str = "DELETE FROM users";
pub(crate) const INSERT: &str = "INSERT INTO users (name) VALUES (?)";

pub(crate) const USER_MAPPER: &str = "app.UserMapper";

fn command(id: &str, kind: CommandKind, sql: &str) -> MappedCommand {
    MappedCommand::builder(id, kind, sql).unwrap().build()
}

fn user_query(id: &str, sql: &str) -> MappedCommand {
    MappedCommand::builder(id, CommandKind::Select, sql)
        .unwrap()
        .result_type("User")
        .build()
}

/// Commands behind [`user_contract`]
pub(crate) fn user_commands() -> ConfigurationBuilder {
    Configuration::builder()
        .command(user_query("app.BaseMapper.findAll", FIND_ALL))
        .command(user_query("app.UserMapper.findById", "SELECT * FROM users WHERE id = #{id}"))
        .command(user_query("app.UserMapper.byId", FIND_ALL))
        .command(user_query("app.UserMapper.stream", FIND_ALL))
        .command(user_query("app.UserMapper.scan", FIND_ALL))
        .command(user_query("app.UserMapper.page", FIND_ALL))
        .command(user_query("app.UserMapper.names", FIND_ALL))
        .command(
            MappedCommand::builder("app.UserMapper.ids", CommandKind::Select, FIND_IDS)
                .unwrap()
                .result_type("long")
                .build(),
        )
        .command(
            MappedCommand::builder("app.UserMapper.countAll", CommandKind::Select, COUNT)
                .unwrap()
                .result_type("long")
                .build(),
        )
        .command(command(
            "app.UserMapper.delete",
            CommandKind::Delete,
            "DELETE FROM users WHERE id = #{id}",
        ))
        .command(command("app.UserMapper.removeAll", CommandKind::Delete, DELETE_ALL))
        .command(
            MappedCommand::builder("app.UserMapper.insert", CommandKind::Insert, "INSERT INTO users (name) VALUES (#{name})")
                .unwrap()
                .key_generator(KeyGenerator::Generated {
                    key_properties: vec!["id".into()],
                })
                .build(),
        )
}

/// `app.BaseMapper<T>` with an inherited list query
pub(crate) fn base_contract() -> Arc<Contract> {
    Contract::builder("app.BaseMapper")
        .type_params(["T"])
        .method(MethodDecl::new("findAll", TypeDesc::list(TypeDesc::param("T"))))
        .build()
}

/// `app.UserMapper extends BaseMapper<User>`
pub(crate) fn user_contract() -> Arc<Contract> {
    let user = || TypeDesc::named("User");
    Contract::builder(USER_MAPPER)
        .extends(base_contract(), vec![user()])
        .method(MethodDecl::new("delete", TypeDesc::Primitive(PrimitiveKind::Int)).param("id", TypeDesc::String))
        .method(MethodDecl::new("removeAll", TypeDesc::Primitive(PrimitiveKind::Bool)))
        .method(MethodDecl::new("insert", TypeDesc::Primitive(PrimitiveKind::Int)).param("user", user()))
        .method(MethodDecl::new("findById", TypeDesc::optional(user())).param("id", TypeDesc::String))
        .method(MethodDecl::new("byId", TypeDesc::map(TypeDesc::String, user())).map_key("id"))
        .method(MethodDecl::new("stream", TypeDesc::cursor(user())))
        .method(MethodDecl::new("scan", TypeDesc::Void).row_handler("handler"))
        .method(MethodDecl::new("page", TypeDesc::list(user())).row_bounds("bounds"))
        .method(MethodDecl::new("names", TypeDesc::set(user())))
        .method(MethodDecl::new(
            "ids",
            TypeDesc::array(TypeDesc::Primitive(PrimitiveKind::Long)),
        ))
        .method(MethodDecl::new("countAll", TypeDesc::Primitive(PrimitiveKind::Long)))
        .method(MethodDecl::new("flush", TypeDesc::list(TypeDesc::Any)).flush())
        .build()
}

pub(crate) fn user_rows(count: usize) -> Response {
    let rows = (1..=count)
        .map(|i| vec![Value::String(format!("u{}", i)), Value::String(format!("user {}", i))])
        .collect();
    Response::rows(&["id", "name"], rows)
}

/// Scripted driver answering the `UserMapper` SQL
pub(crate) fn user_driver() -> ScriptedDataSource {
    let driver = ScriptedDataSource::new();
    driver.respond(FIND_ALL, user_rows(3));
    driver.respond(FIND_BY_ID, user_rows(1));
    driver.respond(
        FIND_IDS,
        Response::rows(&["id"], vec![vec![Value::Int(7)], vec![Value::Int(8)]]),
    );
    driver.respond(COUNT, Response::rows(&["count"], vec![vec![Value::Int(3)]]));
    driver.respond(DELETE, Response::update_count(1));
    driver.respond(DELETE_ALL, Response::update_count(0));
    driver.respond(
        INSERT,
        Response::update_count(1).with_generated_keys("id", vec![Value::Int(42)]),
    );
    driver
}

/// Session factory and a registry holding [`user_contract`]
pub(crate) fn setup(config: ConfigurationBuilder, driver: &ScriptedDataSource) -> (SessionFactory, MapperRegistry) {
    let factory = SessionFactory::new(config.build().unwrap(), Arc::new(driver.clone()));
    let mut registry = MapperRegistry::new(Arc::clone(factory.configuration()));
    registry.add_contract(user_contract()).unwrap();
    (factory, registry)
}
