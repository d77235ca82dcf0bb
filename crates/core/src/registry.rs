//! The command registry: the single store of compiled commands.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::MappedCommand;
use crate::error::{Error, Result};

/// Commands keyed by identifier (`<contract>.<method>`).
///
/// Built once while the configuration is assembled and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<MappedCommand>>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the identifier is already registered.
    pub fn add(&mut self, command: MappedCommand) -> Result<()> {
        if self.commands.contains_key(command.id()) {
            return Err(Error::config(format!(
                "command registry already contains a command with id '{}'",
                command.id()
            )));
        }
        self.commands
            .insert(command.id().to_string(), Arc::new(command));
        Ok(())
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    /// The command registered under `id`, if any
    pub fn find(&self, id: &str) -> Option<&Arc<MappedCommand>> {
        self.commands.get(id)
    }

    /// The command registered under `id`.
    ///
    /// # Errors
    ///
    /// [`Error::CommandNotFound`] when nothing is registered under `id`.
    pub fn get(&self, id: &str) -> Result<&Arc<MappedCommand>> {
        self.find(id).ok_or_else(|| Error::CommandNotFound { id: id.to_string() })
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no command is registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
