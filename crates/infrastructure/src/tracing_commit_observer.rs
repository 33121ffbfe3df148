use async_trait::async_trait;
use interlock_application::CommitObserver;
use interlock_core::AppResult;
use interlock_domain::{AuditRecord, MigrationRecord};
use tracing::info;

/// Commit observer writing notifications to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCommitObserver;

#[async_trait]
impl CommitObserver for TracingCommitObserver {
    async fn audits_added(&self, accessor_name: &str, audits: &[AuditRecord]) -> AppResult<()> {
        info!(accessor = %accessor_name, count = audits.len(), "audits added");
        Ok(())
    }

    async fn migration_added(&self, migration: &MigrationRecord) -> AppResult<()> {
        info!(
            accessor = %migration.accessor_name,
            snapshot = %migration.model_snapshot_name,
            hash = %migration.model_hash,
            "migration added"
        );
        Ok(())
    }
}
