//! # Bindery Binding
//!
//! Turns calls on declared data-access contracts into session commands:
//! - [`Contract`] / [`MethodDecl`] - explicit contract descriptions
//! - [`CommandResolver`] - which registered command a method runs
//! - [`SignatureDescriptor`] - return shape, special parameters, naming
//! - [`ResultShaper`] - raw results into declared return types
//! - [`MethodBinder`] - one bound method
//! - [`MapperRegistry`] / [`Mapper`] - binding tables per contract
//!
//! Command ids follow `<contract name>.<method name>`; both are taken
//! verbatim from the contract.
//!
//! ## Quick Start
//!
//! ```text
//! let user_mapper = Contract::builder("app.UserMapper")
//!     .method(MethodDecl::new("delete", TypeDesc::Primitive(PrimitiveKind::Int)).param("id", TypeDesc::String))
//!     .build();
//!
//! let mut registry = MapperRegistry::new(config);
//! registry.add_contract(user_mapper)?;
//!
//! let mut session = factory.open_session()?;
//! let out = registry.mapper("app.UserMapper", &mut session)?.call("delete", &mut [Arg::Value("u1".into())])?;
//! assert_eq!(out.as_int(), Some(1));
//! ```

#![warn(clippy::all)]

mod binder;
mod contract;
mod mapper;
mod output;
mod param_names;
mod resolver;
mod shaper;
mod signature;

#[cfg(test)]
mod tests;

pub use binder::{Arg, MethodBinder};
pub use contract::{Contract, ContractBuilder, MethodDecl, ParamDecl, ParamKind, ParentRef};
pub use mapper::{Mapper, MapperRegistry};
pub use output::Output;
pub use param_names::ParamNameResolver;
pub use resolver::{CommandDescriptor, CommandResolver};
pub use shaper::ResultShaper;
pub use signature::{ReturnKind, SignatureDescriptor};
