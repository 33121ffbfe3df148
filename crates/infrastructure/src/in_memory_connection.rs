use std::collections::BTreeSet;

use async_trait::async_trait;
use interlock_application::{ConnectionState, DataConnection};
use interlock_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// In-memory data connection tracking its target and lifecycle.
///
/// Opening fails for targets listed as unreachable, which lets callers
/// exercise connection failure handling.
#[derive(Debug)]
pub struct InMemoryConnection {
    connection_string: RwLock<String>,
    state: RwLock<ConnectionState>,
    created_databases: RwLock<BTreeSet<String>>,
    unreachable: BTreeSet<String>,
}

impl InMemoryConnection {
    /// Creates a closed connection targeting `connection_string`.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: RwLock::new(connection_string.into()),
            state: RwLock::new(ConnectionState::Closed),
            created_databases: RwLock::new(BTreeSet::new()),
            unreachable: BTreeSet::new(),
        }
    }

    /// Marks a target as unreachable.
    #[must_use]
    pub fn with_unreachable(mut self, connection_string: impl Into<String>) -> Self {
        self.unreachable.insert(connection_string.into());
        self
    }

    /// Returns the targets created through [`DataConnection::ensure_created`].
    pub async fn created_databases(&self) -> Vec<String> {
        self.created_databases.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl DataConnection for InMemoryConnection {
    async fn connection_string(&self) -> String {
        self.connection_string.read().await.clone()
    }

    async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    async fn open(&self) -> AppResult<()> {
        let target = self.connection_string.read().await;
        if target.trim().is_empty() {
            return Err(AppError::Connection(
                "connection string must not be empty".to_owned(),
            ));
        }
        if self.unreachable.contains(target.as_str()) {
            return Err(AppError::Connection(format!(
                "target '{}' is unreachable",
                target.as_str()
            )));
        }

        *self.state.write().await = ConnectionState::Open;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        *self.state.write().await = ConnectionState::Closed;
        Ok(())
    }

    async fn change_connection_string(&self, connection_string: &str) -> AppResult<()> {
        if *self.state.read().await == ConnectionState::Open {
            return Err(AppError::Connection(
                "cannot change the connection string of an open connection".to_owned(),
            ));
        }

        *self.connection_string.write().await = connection_string.to_owned();
        Ok(())
    }

    async fn ensure_created(&self) -> AppResult<()> {
        let target = self.connection_string.read().await.clone();
        self.created_databases.write().await.insert(target);
        Ok(())
    }
}
