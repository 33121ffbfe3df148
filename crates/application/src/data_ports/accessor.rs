use std::sync::Arc;

use async_trait::async_trait;
use interlock_core::AppResult;
use interlock_domain::{AuditRecord, ChangeEntry};

use super::DataConnection;

/// Unit-of-work port instrumented by the save pipeline.
///
/// One accessor instance owns one live connection. Audits staged through
/// [`Accessor::stage_audits`] must be written by the next
/// [`Accessor::save_changes`] call in the same transaction as the entity
/// changes.
#[async_trait]
pub trait Accessor: Send + Sync {
    /// Returns the accessor name recorded on migration records.
    fn accessor_name(&self) -> &str;

    /// Returns the live connection of this accessor.
    fn connection(&self) -> Arc<dyn DataConnection>;

    /// Returns the pending entity changes.
    async fn tracked_changes(&self) -> AppResult<Vec<ChangeEntry>>;

    /// Adds audit records to the pending unit of work.
    async fn stage_audits(&self, audits: Vec<AuditRecord>) -> AppResult<()>;

    /// Drops audit records staged since the last commit.
    async fn discard_staged_audits(&self) -> AppResult<()>;

    /// Writes all pending changes and returns the affected entity count.
    async fn save_changes(&self) -> AppResult<u64>;
}
