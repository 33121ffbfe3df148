use async_trait::async_trait;
use interlock_core::AppResult;
use interlock_domain::{AuditRecord, MigrationRecord};

/// Notification port invoked after a successful commit.
#[async_trait]
pub trait CommitObserver: Send + Sync {
    /// Receives the audit records written by one commit.
    async fn audits_added(&self, accessor_name: &str, audits: &[AuditRecord]) -> AppResult<()>;

    /// Receives the migration record appended after one commit.
    async fn migration_added(&self, migration: &MigrationRecord) -> AppResult<()>;
}
