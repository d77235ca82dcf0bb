//! Session construction.

use std::sync::Arc;

use bindery_core::{Configuration, ExecutorType, Result};
use tracing::info;

use crate::driver::{Connection, DataSource};
use crate::executor::Executor;
use crate::session::DefaultSession;
use crate::transaction::{ConnectionTransaction, Transaction};

/// Opens sessions that share one [`Configuration`] and one data source.
///
/// Cloning is cheap; clones share the configuration and the data source.
#[derive(Clone)]
pub struct SessionFactory {
    config: Arc<Configuration>,
    data_source: Arc<dyn DataSource>,
}

impl SessionFactory {
    /// Create a factory
    pub fn new(config: Configuration, data_source: Arc<dyn DataSource>) -> Self {
        Self {
            config: Arc::new(config),
            data_source,
        }
    }

    /// The shared configuration
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.config
    }

    /// Session with the default executor type, not auto-committing
    pub fn open_session(&self) -> Result<DefaultSession> {
        self.open_session_with(self.config.settings().default_executor_type, false)
    }

    /// Session with an explicit executor type and auto-commit mode
    pub fn open_session_with(&self, executor_type: ExecutorType, auto_commit: bool) -> Result<DefaultSession> {
        let transaction = ConnectionTransaction::new(Arc::clone(&self.data_source), auto_commit);
        self.open(executor_type, Box::new(transaction), auto_commit)
    }

    /// Session over a connection the caller already holds; auto-commit
    /// follows the connection's current mode
    pub fn open_session_with_connection(
        &self,
        executor_type: ExecutorType,
        connection: Box<dyn Connection>,
    ) -> Result<DefaultSession> {
        let transaction = ConnectionTransaction::from_connection(connection)?;
        let auto_commit = transaction.is_auto_commit();
        self.open(executor_type, Box::new(transaction), auto_commit)
    }

    fn open(
        &self,
        executor_type: ExecutorType,
        transaction: Box<dyn Transaction>,
        auto_commit: bool,
    ) -> Result<DefaultSession> {
        info!(target: "bindery::session", ?executor_type, auto_commit, "Opening session");
        let executor = Executor::new(Arc::clone(&self.config), transaction, executor_type);
        Ok(DefaultSession::new(Arc::clone(&self.config), executor, auto_commit))
    }
}
