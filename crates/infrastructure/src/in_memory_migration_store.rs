use async_trait::async_trait;
use interlock_application::MigrationStore;
use interlock_core::AppResult;
use interlock_domain::MigrationRecord;
use tokio::sync::RwLock;

/// In-memory migration history.
#[derive(Debug, Default)]
pub struct InMemoryMigrationStore {
    migrations: RwLock<Vec<MigrationRecord>>,
}

impl InMemoryMigrationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MigrationStore for InMemoryMigrationStore {
    async fn list_migrations(&self, accessor_name: &str) -> AppResult<Vec<MigrationRecord>> {
        let mut migrations: Vec<MigrationRecord> = self
            .migrations
            .read()
            .await
            .iter()
            .filter(|migration| migration.accessor_name == accessor_name)
            .cloned()
            .collect();
        migrations.sort_by_key(|migration| migration.created_time_ticks);

        Ok(migrations)
    }

    async fn append_migration(&self, migration: &MigrationRecord) -> AppResult<()> {
        self.migrations.write().await.push(migration.clone());
        Ok(())
    }
}
