//! Registered contracts and the mappers that call through them.

use std::sync::Arc;

use bindery_core::{Configuration, Error, Result};
use bindery_executor::SqlSession;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::binder::{Arg, MethodBinder};
use crate::contract::Contract;
use crate::output::Output;

/// A contract with every visible method bound
#[derive(Debug)]
struct BoundContract {
    contract: Arc<Contract>,
    methods: FxHashMap<String, MethodBinder>,
}

/// Binding tables for registered contracts, built once per contract.
///
/// # Thread Safety
///
/// After registration the tables are read-only and may be shared across
/// threads; each [`Mapper`] borrows its own session.
///
/// # Example
///
/// ```ignore
/// let mut registry = MapperRegistry::new(config.clone());
/// registry.add_contract(user_mapper)?;
///
/// let mut session = factory.open_session()?;
/// let mut mapper = registry.mapper("app.UserMapper", &mut session)?;
/// let deleted = mapper.call("delete", &mut [Arg::Value("u1".into())])?;
/// ```
#[derive(Debug)]
pub struct MapperRegistry {
    config: Arc<Configuration>,
    contracts: FxHashMap<String, Arc<BoundContract>>,
}

impl MapperRegistry {
    /// Create an empty registry over `config`
    pub fn new(config: Arc<Configuration>) -> Self {
        Self {
            config,
            contracts: FxHashMap::default(),
        }
    }

    /// Configuration the methods are bound against
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.config
    }

    /// Bind every method visible on `contract`.
    ///
    /// Child declarations shadow inherited ones. Nothing is registered when
    /// any method fails to bind.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when the contract is already registered or one of
    /// its methods cannot be bound.
    pub fn add_contract(&mut self, contract: Arc<Contract>) -> Result<()> {
        if self.contracts.contains_key(contract.name()) {
            return Err(Error::binding(format!(
                "contract {} is already known to the mapper registry",
                contract.name()
            )));
        }

        let mut methods = FxHashMap::default();
        for (declaring, method) in contract.visible_methods() {
            let binder = MethodBinder::new(&self.config, &contract, declaring, method)?;
            methods.insert(method.name().to_string(), binder);
        }

        info!(
            target: "bindery::binding",
            contract = contract.name(),
            methods = methods.len(),
            "Registered mapper contract"
        );
        self.contracts.insert(
            contract.name().to_string(),
            Arc::new(BoundContract { contract, methods }),
        );
        Ok(())
    }

    /// Whether `name` is registered
    pub fn has_contract(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Registered contract names, sorted
    pub fn contract_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contracts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The binder of `contract.method`, if registered
    pub fn binder(&self, contract: &str, method: &str) -> Option<&MethodBinder> {
        self.contracts.get(contract)?.methods.get(method)
    }

    /// A mapper for `name` calling through `session`.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when `name` was never registered.
    pub fn mapper<'s>(&self, name: &str, session: &'s mut dyn SqlSession) -> Result<Mapper<'s>> {
        let bound = self
            .contracts
            .get(name)
            .ok_or_else(|| Error::binding(format!("contract {} is not known to the mapper registry", name)))?;
        Ok(Mapper {
            bound: Arc::clone(bound),
            session,
        })
    }
}

/// Calls contract methods on one session
pub struct Mapper<'s> {
    bound: Arc<BoundContract>,
    session: &'s mut dyn SqlSession,
}

impl Mapper<'_> {
    /// The contract this mapper calls through
    pub fn contract(&self) -> &Contract {
        &self.bound.contract
    }

    /// Call `method` with `args`.
    ///
    /// # Errors
    ///
    /// [`Error::Binding`] when the contract has no such method, otherwise
    /// whatever [`MethodBinder::execute`] reports.
    pub fn call(&mut self, method: &str, args: &mut [Arg<'_>]) -> Result<Output> {
        let binder = self.bound.methods.get(method).ok_or_else(|| {
            Error::binding(format!(
                "contract {} has no method named {}",
                self.bound.contract.name(),
                method
            ))
        })?;
        binder.execute(&mut *self.session, args)
    }

    /// The session calls run on
    pub fn session(&mut self) -> &mut dyn SqlSession {
        &mut *self.session
    }
}
