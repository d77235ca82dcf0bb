//! Per-method binding: resolve once, execute many times.

use std::fmt;

use bindery_core::{CommandKind, Configuration, Error, Parameter, Result, RowBounds, RowHandler, Value};
use bindery_executor::SqlSession;
use tracing::debug;

use crate::contract::{Contract, MethodDecl};
use crate::output::Output;
use crate::resolver::{CommandDescriptor, CommandResolver};
use crate::shaper::{unsupported_return_type, ResultShaper};
use crate::signature::{ReturnKind, SignatureDescriptor};

/// One argument of a bound call
pub enum Arg<'a> {
    /// A value; generated keys and OUT parameters are written back here
    Value(Value),
    /// Pagination
    Bounds(RowBounds),
    /// Per-row callback
    Handler(&'a mut dyn RowHandler),
}

impl Arg<'_> {
    /// The value of a value argument
    pub fn value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Arg::Bounds(bounds) => f.debug_tuple("Bounds").field(bounds).finish(),
            Arg::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<Value> for Arg<'_> {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<RowBounds> for Arg<'_> {
    fn from(bounds: RowBounds) -> Self {
        Arg::Bounds(bounds)
    }
}

/// A contract method bound to its command.
///
/// The command and the signature are resolved in [`MethodBinder::new`] and
/// never change afterwards, so one binder serves every session and thread.
#[derive(Debug, Clone)]
pub struct MethodBinder {
    name: String,
    command: CommandDescriptor,
    signature: SignatureDescriptor,
}

impl MethodBinder {
    /// Bind `method`, invoked through `contract` and declared on `declaring`.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when the command cannot be resolved, the signature
    /// is malformed, a mutation declares a return type a row count cannot
    /// become, or a row-callback query targets a command without a declared
    /// result type.
    pub fn new(config: &Configuration, contract: &Contract, declaring: &Contract, method: &MethodDecl) -> Result<Self> {
        let command = CommandResolver::resolve(contract, method, declaring, config.registry())?;
        let signature = SignatureDescriptor::new(config, contract, declaring, method)?;
        let name = format!("{}.{}", contract.name(), method.name());

        if command.kind().is_mutation() && !ResultShaper::supports_row_count(signature.return_type()) {
            return Err(unsupported_return_type(signature.return_type()));
        }
        if command.kind() == CommandKind::Select
            && signature.return_kind() == ReturnKind::Void
            && signature.has_row_handler()
        {
            let id = command.display_id();
            if config.registry().get(id)?.result_type().is_none() {
                return Err(Error::binding(format!(
                    "method {} needs a result type on command {} so a RowHandler can be used as a parameter",
                    name, id
                )));
            }
        }

        debug!(
            target: "bindery::binding",
            method = %name,
            command = command.display_id(),
            kind = ?command.kind(),
            return_kind = ?signature.return_kind(),
            "Bound method"
        );
        Ok(Self {
            name,
            command,
            signature,
        })
    }

    /// `<contract>.<method>` this binder was created for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved command
    pub fn command(&self) -> &CommandDescriptor {
        &self.command
    }

    /// Analyzed signature
    pub fn signature(&self) -> &SignatureDescriptor {
        &self.signature
    }

    /// Run the bound command on `session` with the call's arguments.
    ///
    /// Values the execution writes into the parameter object (generated
    /// keys, OUT parameters) are copied back into the value arguments.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when the arguments do not match the declared
    /// parameters; [`Error::NullIntoPrimitive`] when a null result meets a
    /// primitive return type; anything the session reports.
    pub fn execute(&self, session: &mut dyn SqlSession, args: &mut [Arg<'_>]) -> Result<Output> {
        self.check_args(args)?;
        let mut parameter = self.signature.param_names().named_params(args)?;
        let id = self.command.display_id();

        let output = match self.command.kind() {
            CommandKind::Insert => {
                let count = session.insert(id, &mut parameter)?;
                self.shaper(session).row_count(count)?
            }
            CommandKind::Update => {
                let count = session.update(id, &mut parameter)?;
                self.shaper(session).row_count(count)?
            }
            CommandKind::Delete => {
                let count = session.delete(id, &mut parameter)?;
                self.shaper(session).row_count(count)?
            }
            CommandKind::Select => self.execute_select(session, &mut parameter, args)?,
            CommandKind::Flush => Output::Batch(session.flush_statements()?),
            CommandKind::Unknown => {
                return Err(Error::binding(format!("unknown execution method for: {}", id)));
            }
        };

        self.signature.param_names().write_back(&parameter, args);
        self.shaper(session).check_null_into_primitive(&output, id)?;
        Ok(output)
    }

    fn execute_select(
        &self,
        session: &mut dyn SqlSession,
        parameter: &mut Parameter,
        args: &mut [Arg<'_>],
    ) -> Result<Output> {
        let id = self.command.display_id();
        let bounds = self.signature.row_bounds(args);

        match self.signature.return_kind() {
            ReturnKind::Void if self.signature.has_row_handler() => {
                let handler = self.row_handler(args)?;
                session.select_with_handler(id, parameter, bounds, handler)?;
                Ok(Output::Unit)
            }
            ReturnKind::Void => {
                session.select_one(id, parameter)?;
                Ok(Output::Unit)
            }
            ReturnKind::Many => {
                let rows = session.select_list(id, parameter, bounds)?;
                self.shaper(session).many(rows)
            }
            ReturnKind::Map => {
                let map_key = self
                    .signature
                    .map_key()
                    .ok_or_else(|| Error::binding(format!("{} has no map key", self.name)))?;
                Ok(Output::Map(session.select_map(id, parameter, map_key, bounds)?))
            }
            ReturnKind::Cursor => Ok(Output::Cursor(session.select_cursor(id, parameter, bounds)?)),
            ReturnKind::Optional => {
                let value = session.select_one(id, parameter)?;
                Ok(self.shaper(session).optional(value))
            }
            ReturnKind::Scalar => Ok(Output::Value(session.select_one(id, parameter)?.unwrap_or(Value::Null))),
        }
    }

    fn shaper<'s>(&'s self, session: &'s dyn SqlSession) -> ResultShaper<'s> {
        ResultShaper::new(session.configuration(), &self.signature)
    }

    fn row_handler<'s>(&self, args: &'s mut [Arg<'_>]) -> Result<&'s mut dyn RowHandler> {
        match self.signature.row_handler_index().and_then(|i| args.get_mut(i)) {
            Some(Arg::Handler(handler)) => Ok(&mut **handler),
            _ => Err(Error::binding(format!("{} was called without its RowHandler", self.name))),
        }
    }

    fn check_args(&self, args: &[Arg<'_>]) -> Result<()> {
        if args.len() != self.signature.arity() {
            return Err(Error::binding(format!(
                "wrong number of arguments for {}: expected {}, got {}",
                self.name,
                self.signature.arity(),
                args.len()
            )));
        }
        if let Some(index) = self.signature.row_bounds_index() {
            if !matches!(args[index], Arg::Bounds(_)) {
                return Err(Error::binding(format!("argument {} of {} must be RowBounds", index, self.name)));
            }
        }
        if let Some(index) = self.signature.row_handler_index() {
            if !matches!(args[index], Arg::Handler(_)) {
                return Err(Error::binding(format!("argument {} of {} must be a RowHandler", index, self.name)));
            }
        }
        Ok(())
    }
}
