//! Transaction wrapper around one connection.
//!
//! The connection is acquired lazily on first use and released on close.

use std::sync::Arc;

use bindery_core::{Error, Result};
use tracing::debug;

use crate::driver::{Connection, DataSource};

/// Connection holder an executor runs its statements on.
pub trait Transaction: Send {
    /// The connection, opened on first call
    fn connection(&mut self) -> Result<&mut dyn Connection>;

    /// Commit (no-op in auto-commit mode)
    fn commit(&mut self) -> Result<()>;

    /// Roll back (no-op in auto-commit mode)
    fn rollback(&mut self) -> Result<()>;

    /// Release the connection
    fn close(&mut self) -> Result<()>;

    /// Transaction-wide statement timeout in seconds
    fn timeout(&self) -> Option<u32>;
}

/// Transaction driven directly through the connection's commit/rollback.
pub struct ConnectionTransaction {
    data_source: Option<Arc<dyn DataSource>>,
    connection: Option<Box<dyn Connection>>,
    auto_commit: bool,
    timeout: Option<u32>,
}

impl ConnectionTransaction {
    /// Transaction that opens its connection from `data_source` when first needed
    pub fn new(data_source: Arc<dyn DataSource>, auto_commit: bool) -> Self {
        Self {
            data_source: Some(data_source),
            connection: None,
            auto_commit,
            timeout: None,
        }
    }

    /// Transaction over a connection supplied by the caller.
    ///
    /// If the connection's mode cannot be read it is closed (ignoring any
    /// close failure) and the read error returned.
    pub fn from_connection(mut connection: Box<dyn Connection>) -> Result<Self> {
        let auto_commit = match connection.auto_commit() {
            Ok(auto_commit) => auto_commit,
            Err(e) => {
                if let Err(close_error) = connection.close() {
                    debug!(target: "bindery::transaction", error = %close_error, "Ignoring failure while closing connection");
                }
                return Err(e);
            }
        };
        Ok(Self {
            data_source: None,
            connection: Some(connection),
            auto_commit,
            timeout: None,
        })
    }

    /// Auto-commit mode the transaction runs in
    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Apply a transaction-wide statement timeout
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }

    fn open_connection(&mut self) -> Result<()> {
        let data_source = self.data_source.as_ref().ok_or_else(|| Error::Transaction {
            reason: "transaction has no connection and no data source".into(),
        })?;
        debug!(target: "bindery::transaction", "Opening connection");
        let mut connection = data_source.connect()?;
        if connection.auto_commit()? != self.auto_commit {
            debug!(target: "bindery::transaction", auto_commit = self.auto_commit, "Setting auto-commit");
            connection.set_auto_commit(self.auto_commit)?;
        }
        self.connection = Some(connection);
        Ok(())
    }
}

impl Transaction for ConnectionTransaction {
    fn connection(&mut self) -> Result<&mut dyn Connection> {
        if self.connection.is_none() {
            self.open_connection()?;
        }
        match self.connection.as_deref_mut() {
            Some(connection) => Ok(connection),
            None => Err(Error::Transaction {
                reason: "connection unavailable".into(),
            }),
        }
    }

    fn commit(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.as_deref_mut() {
            if !connection.auto_commit()? {
                debug!(target: "bindery::transaction", "Committing connection");
                connection.commit()?;
            }
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.as_deref_mut() {
            if !connection.auto_commit()? {
                debug!(target: "bindery::transaction", "Rolling back connection");
                connection.rollback()?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            debug!(target: "bindery::transaction", "Closing connection");
            connection.close()?;
        }
        Ok(())
    }

    fn timeout(&self) -> Option<u32> {
        self.timeout
    }
}
