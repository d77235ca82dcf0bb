//! Resolving which registered command a contract method invokes.

use std::sync::Arc;

use bindery_core::{CommandKind, CommandRegistry, Error, MappedCommand, Result, TypeDesc};

use crate::contract::{Contract, MethodDecl};

/// The command a bound method runs.
///
/// Flush-tagged methods without a registered command carry no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    id: Option<String>,
    kind: CommandKind,
}

impl CommandDescriptor {
    /// Registered command id; `None` for a synthesized flush
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Command kind
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Id for messages: the command id, or `FLUSH`
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("FLUSH")
    }
}

/// Resolves commands and return types for contract methods.
///
/// Resolution is a pure function of the contract, the method and the
/// registry; it is run once per method when the method is bound.
pub struct CommandResolver;

impl CommandResolver {
    /// Resolve `method`, invoked through `contract` and declared on `declaring`.
    ///
    /// The id `<contract>.<method>` is tried first. Otherwise every parent of
    /// `contract` that extends `declaring` is searched depth-first in
    /// declaration order, stopping at the first match.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when no command is registered and the method is not
    /// tagged as a flush, or when the command's kind cannot be executed.
    pub fn resolve(
        contract: &Contract,
        method: &MethodDecl,
        declaring: &Contract,
        registry: &CommandRegistry,
    ) -> Result<CommandDescriptor> {
        match find_command(contract, method.name(), declaring, registry) {
            Some(command) => {
                if command.kind() == CommandKind::Unknown {
                    return Err(Error::binding(format!(
                        "unknown execution method for: {}",
                        command.id()
                    )));
                }
                Ok(CommandDescriptor {
                    id: Some(command.id().to_string()),
                    kind: command.kind(),
                })
            }
            None if method.is_flush() => Ok(CommandDescriptor {
                id: None,
                kind: CommandKind::Flush,
            }),
            None => Err(Error::binding(format!(
                "invalid bound statement (not found): {}.{}",
                contract.name(),
                method.name()
            ))),
        }
    }

    /// The declared return type of `method` as seen through `contract`.
    ///
    /// Type parameters of the declaring contract are substituted with the
    /// arguments each extension step supplies, walking from `declaring` back
    /// up to `contract`. Parameters left unbound erase to [`TypeDesc::Any`].
    pub fn resolve_return_type(contract: &Contract, method: &MethodDecl, declaring: &Contract) -> TypeDesc {
        let mut resolved = method.return_type().clone();
        if let Some(path) = contract.path_to(declaring) {
            for step in path.iter().rev() {
                let params = step.contract.type_params();
                resolved = resolved.substitute(&|name| {
                    params
                        .iter()
                        .position(|p| p == name)
                        .and_then(|i| step.type_args.get(i).cloned())
                });
            }
        }
        resolved.erase_params()
    }
}

fn find_command<'r>(
    contract: &Contract,
    method_name: &str,
    declaring: &Contract,
    registry: &'r CommandRegistry,
) -> Option<&'r Arc<MappedCommand>> {
    let id = format!("{}.{}", contract.name(), method_name);
    if let Some(command) = registry.find(&id) {
        return Some(command);
    }
    if contract.name() == declaring.name() {
        return None;
    }
    contract
        .parents()
        .iter()
        .filter(|parent| parent.contract.is_subtype_of(declaring))
        .find_map(|parent| find_command(&parent.contract, method_name, declaring, registry))
}
