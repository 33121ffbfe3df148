use async_trait::async_trait;
use interlock_core::AppResult;

/// Lifecycle state of a data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No physical connection is held.
    Closed,
    /// A physical connection is held.
    Open,
}

/// Port for the live database connection owned by one accessor.
#[async_trait]
pub trait DataConnection: Send + Sync {
    /// Returns the active connection string.
    async fn connection_string(&self) -> String;

    /// Returns the connection state.
    async fn state(&self) -> ConnectionState;

    /// Opens the connection.
    async fn open(&self) -> AppResult<()>;

    /// Closes the connection.
    async fn close(&self) -> AppResult<()>;

    /// Re-targets a closed connection.
    ///
    /// Implementations reject the change while the connection is open.
    async fn change_connection_string(&self, connection_string: &str) -> AppResult<()>;

    /// Creates the target database and schema when missing.
    async fn ensure_created(&self) -> AppResult<()>;
}
