use async_trait::async_trait;
use interlock_application::{ConnectionState, DataConnection};
use interlock_core::{AppError, AppResult};
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use tokio::sync::RwLock;
use tracing::info;

use crate::MIGRATOR;

struct ConnectionSlot {
    connection_string: String,
    pool: Option<PgPool>,
}

/// PostgreSQL data connection backed by a re-targetable pool.
///
/// Opening builds a pool for the current connection string; closing drains it.
pub struct PostgresConnection {
    slot: RwLock<ConnectionSlot>,
    max_connections: u32,
}

impl PostgresConnection {
    /// Creates a closed connection targeting `connection_string`.
    #[must_use]
    pub fn new(connection_string: impl Into<String>, max_connections: u32) -> Self {
        Self {
            slot: RwLock::new(ConnectionSlot {
                connection_string: connection_string.into(),
                pool: None,
            }),
            max_connections: max_connections.max(1),
        }
    }

    /// Returns the pool while the connection is open.
    pub async fn pool(&self) -> Option<PgPool> {
        self.slot.read().await.pool.clone()
    }
}

#[async_trait]
impl DataConnection for PostgresConnection {
    async fn connection_string(&self) -> String {
        self.slot.read().await.connection_string.clone()
    }

    async fn state(&self) -> ConnectionState {
        match self.slot.read().await.pool {
            Some(_) => ConnectionState::Open,
            None => ConnectionState::Closed,
        }
    }

    async fn open(&self) -> AppResult<()> {
        let mut slot = self.slot.write().await;
        if slot.pool.is_some() {
            return Ok(());
        }

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(slot.connection_string.as_str())
            .await
            .map_err(|error| AppError::Connection(format!("failed to open connection: {error}")))?;
        slot.pool = Some(pool);

        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let pool = self.slot.write().await.pool.take();
        if let Some(pool) = pool {
            pool.close().await;
        }

        Ok(())
    }

    async fn change_connection_string(&self, connection_string: &str) -> AppResult<()> {
        let mut slot = self.slot.write().await;
        if slot.pool.is_some() {
            return Err(AppError::Connection(
                "cannot change the connection string of an open connection".to_owned(),
            ));
        }

        slot.connection_string = connection_string.to_owned();
        Ok(())
    }

    async fn ensure_created(&self) -> AppResult<()> {
        let connection_string = self.connection_string().await;
        let exists = Postgres::database_exists(connection_string.as_str())
            .await
            .map_err(|error| {
                AppError::Connection(format!("failed to check database existence: {error}"))
            })?;

        if !exists {
            Postgres::create_database(connection_string.as_str())
                .await
                .map_err(|error| {
                    AppError::Connection(format!("failed to create database: {error}"))
                })?;
            info!("created database for switched connection");
        }

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(connection_string.as_str())
            .await
            .map_err(|error| {
                AppError::Connection(format!("failed to connect for schema creation: {error}"))
            })?;
        let migrated = MIGRATOR
            .run(&pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to create schema: {error}")));
        pool.close().await;

        migrated
    }
}
