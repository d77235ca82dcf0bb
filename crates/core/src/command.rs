//! Registered commands.
//!
//! A [`MappedCommand`] is the compiled, immutable record the command
//! registry stores under an identifier: its kind, the statement strategy
//! it runs with, its SQL source and its execution options.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sql::{SqlSource, StaticSqlSource};

/// What a command does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Insert,
    Update,
    Delete,
    Select,
    /// Flush pending batched statements; never stored in a registry
    Flush,
    /// Kind could not be determined; binding such a command fails
    Unknown,
}

impl CommandKind {
    /// True for insert, update and delete
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            CommandKind::Insert | CommandKind::Update | CommandKind::Delete
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::Insert => "INSERT",
            CommandKind::Update => "UPDATE",
            CommandKind::Delete => "DELETE",
            CommandKind::Select => "SELECT",
            CommandKind::Flush => "FLUSH",
            CommandKind::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Statement-construction strategy a command runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Literal text, no parameter binding
    Statement,
    /// Positional `?` placeholders bound from the parameter object
    Prepared,
    /// Stored-procedure call; supports OUT parameters
    Callable,
}

impl Default for StatementKind {
    fn default() -> Self {
        StatementKind::Prepared
    }
}

/// Post-/pre-execution key generation attached to a mutation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyGenerator {
    #[default]
    None,
    /// Read driver-generated keys into `key_properties`, in column order
    Generated { key_properties: Vec<String> },
    /// Run the select command `command_id` and store its value in `key_property`
    SelectKey {
        command_id: String,
        key_property: String,
        /// Run before the statement instead of after it
        before: bool,
    },
}

/// A compiled command descriptor as stored in the registry.
#[derive(Debug, Clone)]
pub struct MappedCommand {
    id: String,
    kind: CommandKind,
    statement_kind: Option<StatementKind>,
    sql_source: Arc<dyn SqlSource>,
    result_type: Option<String>,
    key_generator: KeyGenerator,
    timeout: Option<u32>,
    fetch_size: Option<u32>,
    flush_cache: bool,
}

impl MappedCommand {
    /// Start building a command whose SQL is a static template.
    ///
    /// # Errors
    ///
    /// Fails when the template's placeholders are malformed.
    pub fn builder(id: impl Into<String>, kind: CommandKind, sql: &str) -> Result<MappedCommandBuilder> {
        let source = StaticSqlSource::parse(sql)?;
        Ok(Self::builder_with_source(id, kind, Arc::new(source)))
    }

    /// Start building a command around any [`SqlSource`]
    pub fn builder_with_source(
        id: impl Into<String>,
        kind: CommandKind,
        sql_source: Arc<dyn SqlSource>,
    ) -> MappedCommandBuilder {
        MappedCommandBuilder {
            command: MappedCommand {
                id: id.into(),
                kind,
                statement_kind: None,
                sql_source,
                result_type: None,
                key_generator: KeyGenerator::None,
                timeout: None,
                fetch_size: None,
                // Mutations flush the local cache by default, selects do not
                flush_cache: kind != CommandKind::Select,
            },
        }
    }

    /// Registry identifier, `<contract>.<method>`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Command kind
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Statement strategy tag; prepared unless set on the command or
    /// through `Settings::default_statement_kind`
    pub fn statement_kind(&self) -> StatementKind {
        self.statement_kind.unwrap_or_default()
    }

    /// Fill in the statement kind when the command left it unset
    pub(crate) fn with_default_statement_kind(mut self, kind: StatementKind) -> Self {
        self.statement_kind.get_or_insert(kind);
        self
    }

    /// SQL source
    pub fn sql_source(&self) -> &dyn SqlSource {
        self.sql_source.as_ref()
    }

    /// Declared row type; `None` means the row shape is untyped
    pub fn result_type(&self) -> Option<&str> {
        self.result_type.as_deref()
    }

    /// Attached key generator
    pub fn key_generator(&self) -> &KeyGenerator {
        &self.key_generator
    }

    /// Per-command statement timeout in seconds
    pub fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    /// Per-command fetch size hint
    pub fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    /// Whether running this command clears the session's local cache
    pub fn flush_cache(&self) -> bool {
        self.flush_cache
    }
}

/// Builder for [`MappedCommand`]
#[derive(Debug)]
pub struct MappedCommandBuilder {
    command: MappedCommand,
}

impl MappedCommandBuilder {
    /// Statement strategy (default: the configured default kind)
    pub fn statement_kind(mut self, kind: StatementKind) -> Self {
        self.command.statement_kind = Some(kind);
        self
    }

    /// Declared row type name
    pub fn result_type(mut self, result_type: impl Into<String>) -> Self {
        self.command.result_type = Some(result_type.into());
        self
    }

    /// Key generator
    pub fn key_generator(mut self, key_generator: KeyGenerator) -> Self {
        self.command.key_generator = key_generator;
        self
    }

    /// Statement timeout in seconds
    pub fn timeout(mut self, seconds: u32) -> Self {
        self.command.timeout = Some(seconds);
        self
    }

    /// Fetch size hint
    pub fn fetch_size(mut self, rows: u32) -> Self {
        self.command.fetch_size = Some(rows);
        self
    }

    /// Override whether this command clears the local cache
    pub fn flush_cache(mut self, flush: bool) -> Self {
        self.command.flush_cache = flush;
        self
    }

    /// Finish
    pub fn build(self) -> MappedCommand {
        self.command
    }
}
