//! Configuration via `bindery.toml`
//!
//! A [`ConfigurationBuilder`] collects settings and commands (from code, a
//! TOML document, or both) and is consumed by its single [`build`] call,
//! producing the immutable [`Configuration`] every session shares.
//!
//! [`build`]: ConfigurationBuilder::build

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::{CommandKind, KeyGenerator, MappedCommand, StatementKind};
use crate::error::{Error, Result};
use crate::object_factory::{DefaultObjectFactory, ObjectFactory};
use crate::registry::CommandRegistry;
use crate::row_mapper::{DefaultRowMapper, RowMapper};

/// Config file name conventionally placed next to the application
pub const CONFIG_FILE_NAME: &str = "bindery.toml";

/// Session-level execution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorType {
    /// One fresh statement per call, closed immediately
    #[default]
    Simple,
    /// Statements cached by SQL text for the session's lifetime
    Reuse,
    /// Mutations queued and sent on flush
    Batch,
}

/// Lifetime of the per-session query cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocalCacheScope {
    /// Cached until a mutation, commit, rollback or explicit clear
    #[default]
    Session,
    /// Cleared after every query
    Statement,
}

/// Global settings, the `[settings]` table of `bindery.toml`.
///
/// # Example
///
/// ```toml
/// [settings]
/// default_executor_type = "reuse"
/// default_statement_timeout = 30
/// map_underscore_to_camel_case = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Executor used by `open_session()`
    pub default_executor_type: ExecutorType,
    /// Statement timeout (seconds) for commands that do not set one
    pub default_statement_timeout: Option<u32>,
    /// Fetch size for commands that do not set one
    pub default_fetch_size: Option<u32>,
    /// Lifetime of the local query cache
    pub local_cache_scope: LocalCacheScope,
    /// Name parameters by their declared name instead of their position
    pub use_actual_param_name: bool,
    /// Map `snake_case` columns to `camelCase` fields
    pub map_underscore_to_camel_case: bool,
    /// Statement kind for commands that do not set one
    pub default_statement_kind: StatementKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_executor_type: ExecutorType::Simple,
            default_statement_timeout: None,
            default_fetch_size: None,
            local_cache_scope: LocalCacheScope::Session,
            use_actual_param_name: true,
            map_underscore_to_camel_case: false,
            default_statement_kind: StatementKind::Prepared,
        }
    }
}

/// `[[command]]` table of `bindery.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandEntry {
    id: String,
    kind: CommandKind,
    sql: String,
    #[serde(default)]
    statement_kind: Option<StatementKind>,
    #[serde(default)]
    result_type: Option<String>,
    #[serde(default)]
    timeout: Option<u32>,
    #[serde(default)]
    fetch_size: Option<u32>,
    #[serde(default)]
    flush_cache: Option<bool>,
    #[serde(default)]
    key_generator: Option<KeyGeneratorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KeyGeneratorEntry {
    Generated {
        key_properties: Vec<String>,
    },
    SelectKey {
        command: String,
        key_property: String,
        #[serde(default)]
        order: KeyOrder,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KeyOrder {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    settings: Option<Settings>,
    #[serde(default, rename = "command")]
    commands: Vec<CommandEntry>,
}

impl CommandEntry {
    fn into_command(self) -> Result<MappedCommand> {
        let mut builder = MappedCommand::builder(self.id, self.kind, &self.sql)?;
        if let Some(kind) = self.statement_kind {
            builder = builder.statement_kind(kind);
        }
        if let Some(result_type) = self.result_type {
            builder = builder.result_type(result_type);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(fetch_size) = self.fetch_size {
            builder = builder.fetch_size(fetch_size);
        }
        if let Some(flush) = self.flush_cache {
            builder = builder.flush_cache(flush);
        }
        if let Some(key_generator) = self.key_generator {
            builder = builder.key_generator(match key_generator {
                KeyGeneratorEntry::Generated { key_properties } => {
                    KeyGenerator::Generated { key_properties }
                }
                KeyGeneratorEntry::SelectKey {
                    command,
                    key_property,
                    order,
                } => KeyGenerator::SelectKey {
                    command_id: command,
                    key_property,
                    before: matches!(order, KeyOrder::Before),
                },
            });
        }
        Ok(builder.build())
    }
}

/// Collects settings, commands and collaborators for one [`Configuration`].
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    settings: Settings,
    commands: Vec<MappedCommand>,
    pending: Vec<CommandEntry>,
    object_factory: Option<Arc<dyn ObjectFactory>>,
    row_mapper: Option<Arc<dyn RowMapper>>,
}

impl ConfigurationBuilder {
    /// Start with default settings and no commands
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `bindery.toml` document.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the document is not valid TOML for this schema.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let doc: ConfigDocument = toml::from_str(content)
            .map_err(|e| Error::config(format!("failed to parse configuration: {}", e)))?;
        Ok(Self {
            settings: doc.settings.unwrap_or_default(),
            pending: doc.commands,
            ..Self::default()
        })
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config { reason } => {
                Error::config(format!("{} ({})", reason, path.display()))
            }
            other => other,
        })
    }

    /// Replace the settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Add a command built in code
    pub fn command(mut self, command: MappedCommand) -> Self {
        self.commands.push(command);
        self
    }

    /// Use a custom object factory
    pub fn object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.object_factory = Some(factory);
        self
    }

    /// Use a custom row mapper
    pub fn row_mapper(mut self, mapper: Arc<dyn RowMapper>) -> Self {
        self.row_mapper = Some(mapper);
        self
    }

    /// Compile every command and assemble the configuration.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for malformed SQL, duplicate command identifiers,
    /// or a select-key generator naming an unknown or non-select command.
    pub fn build(self) -> Result<Configuration> {
        let Self {
            settings,
            commands,
            pending,
            object_factory,
            row_mapper,
        } = self;

        let mut registry = CommandRegistry::new();
        let from_file = pending
            .into_iter()
            .map(CommandEntry::into_command)
            .collect::<Result<Vec<_>>>()?;
        for command in from_file.into_iter().chain(commands) {
            registry.add(command.with_default_statement_kind(settings.default_statement_kind))?;
        }
        validate_key_generators(&registry)?;

        let row_mapper = row_mapper.unwrap_or_else(|| {
            Arc::new(DefaultRowMapper::new(settings.map_underscore_to_camel_case))
        });
        Ok(Configuration {
            settings,
            registry,
            object_factory: object_factory.unwrap_or_else(|| Arc::new(DefaultObjectFactory)),
            row_mapper,
        })
    }
}

fn validate_key_generators(registry: &CommandRegistry) -> Result<()> {
    for id in registry.ids() {
        let command = registry.get(id)?;
        if let KeyGenerator::SelectKey { command_id, .. } = command.key_generator() {
            match registry.find(command_id) {
                Some(key_command) if key_command.kind() == CommandKind::Select => {}
                Some(_) => {
                    return Err(Error::config(format!(
                        "select-key command '{}' of '{}' is not a select",
                        command_id, id
                    )))
                }
                None => {
                    return Err(Error::config(format!(
                        "select-key command '{}' of '{}' is not registered",
                        command_id, id
                    )))
                }
            }
        }
    }
    Ok(())
}

/// Immutable configuration shared by every session of a factory.
pub struct Configuration {
    settings: Settings,
    registry: CommandRegistry,
    object_factory: Arc<dyn ObjectFactory>,
    row_mapper: Arc<dyn RowMapper>,
}

impl Configuration {
    /// Start a builder
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Global settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The command registry
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The object factory
    pub fn object_factory(&self) -> &dyn ObjectFactory {
        self.object_factory.as_ref()
    }

    /// The row mapper
    pub fn row_mapper(&self) -> &Arc<dyn RowMapper> {
        &self.row_mapper
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("settings", &self.settings)
            .field("commands", &self.registry.ids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOC: &str = r#"
[settings]
default_executor_type = "batch"
default_statement_timeout = 15
map_underscore_to_camel_case = true

[[command]]
id = "app.UserMapper.findAll"
kind = "select"
sql = "SELECT id, user_name FROM users"
result_type = "User"

[[command]]
id = "app.UserMapper.insert"
kind = "insert"
sql = "INSERT INTO users (user_name) VALUES (#{name})"
key_generator = { type = "generated", key_properties = ["id"] }

[[command]]
id = "app.UserMapper.nextId"
kind = "select"
sql = "SELECT next_id()"
result_type = "long"

[[command]]
id = "app.UserMapper.insertWithId"
kind = "insert"
sql = "INSERT INTO users (id, user_name) VALUES (#{id}, #{name})"
key_generator = { type = "select_key", command = "app.UserMapper.nextId", key_property = "id", order = "before" }
"#;

    #[test]
    fn test_parse_settings_and_commands() {
        let config = ConfigurationBuilder::from_toml_str(DOC).unwrap().build().unwrap();
        assert_eq!(config.settings().default_executor_type, ExecutorType::Batch);
        assert_eq!(config.settings().default_statement_timeout, Some(15));
        assert!(config.settings().use_actual_param_name);
        assert_eq!(config.registry().len(), 4);

        let insert = config.registry().get("app.UserMapper.insert").unwrap();
        assert_eq!(insert.kind(), CommandKind::Insert);
        assert_eq!(
            insert.key_generator(),
            &KeyGenerator::Generated {
                key_properties: vec!["id".into()]
            }
        );
        let with_id = config.registry().get("app.UserMapper.insertWithId").unwrap();
        assert!(matches!(
            with_id.key_generator(),
            KeyGenerator::SelectKey { before: true, .. }
        ));
    }

    #[test]
    fn test_defaults_without_settings_table() {
        let config = ConfigurationBuilder::from_toml_str("").unwrap().build().unwrap();
        assert_eq!(config.settings(), &Settings::default());
        assert!(config.registry().is_empty());
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let err = ConfigurationBuilder::from_toml_str("[settings]\nlazy_loading = true\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_duplicate_between_file_and_code_rejected() {
        let cmd = MappedCommand::builder("app.UserMapper.findAll", CommandKind::Select, "SELECT 1")
            .unwrap()
            .build();
        let err = ConfigurationBuilder::from_toml_str(DOC)
            .unwrap()
            .command(cmd)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("app.UserMapper.findAll"));
    }

    #[test]
    fn test_select_key_must_reference_a_select() {
        let doc = r#"
[[command]]
id = "a.M.insert"
kind = "insert"
sql = "INSERT INTO t VALUES (#{id})"
key_generator = { type = "select_key", command = "a.M.missing", key_property = "id" }
"#;
        let err = ConfigurationBuilder::from_toml_str(doc).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("a.M.missing"));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        let config = ConfigurationBuilder::from_file(file.path()).unwrap().build().unwrap();
        assert!(config.registry().contains("app.UserMapper.nextId"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ConfigurationBuilder::from_file(Path::new("/nonexistent/bindery.toml")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_default_statement_kind_applies_to_file_commands() {
        let doc = r#"
[settings]
default_statement_kind = "statement"

[[command]]
id = "a.M.purge"
kind = "delete"
sql = "DELETE FROM t"
"#;
        let config = ConfigurationBuilder::from_toml_str(doc).unwrap().build().unwrap();
        assert_eq!(
            config.registry().get("a.M.purge").unwrap().statement_kind(),
            StatementKind::Statement
        );
    }

    #[test]
    fn test_default_statement_kind_applies_to_code_commands() {
        let settings = Settings {
            default_statement_kind: StatementKind::Statement,
            ..Settings::default()
        };
        let config = ConfigurationBuilder::new()
            .settings(settings)
            .command(MappedCommand::builder("a.M.one", CommandKind::Select, "SELECT 1").unwrap().build())
            .command(
                MappedCommand::builder("a.M.two", CommandKind::Select, "SELECT 2")
                    .unwrap()
                    .statement_kind(StatementKind::Prepared)
                    .build(),
            )
            .build()
            .unwrap();
        assert_eq!(config.registry().get("a.M.one").unwrap().statement_kind(), StatementKind::Statement);
        assert_eq!(config.registry().get("a.M.two").unwrap().statement_kind(), StatementKind::Prepared);
    }
}
