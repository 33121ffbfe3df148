use async_trait::async_trait;
use interlock_core::AppResult;
use interlock_domain::{AuditRecord, MigrationRecord, StoredTenant};

/// Port for persisting append-only audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends audit records with their property records.
    async fn append_audits(&self, audits: &[AuditRecord]) -> AppResult<()>;

    /// Lists audit records of one entity, oldest first.
    async fn list_audits_for_entity(
        &self,
        entity_type_name: &str,
        entity_id: &str,
    ) -> AppResult<Vec<AuditRecord>>;
}

/// Port for the schema history of one or more accessors.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Lists the migration records of one accessor.
    async fn list_migrations(&self, accessor_name: &str) -> AppResult<Vec<MigrationRecord>>;

    /// Appends one migration record.
    async fn append_migration(&self, migration: &MigrationRecord) -> AppResult<()>;
}

/// Port for persisted tenants.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Returns true when a tenant with the name and host exists.
    async fn contains_tenant(&self, name: &str, host: &str) -> AppResult<bool>;

    /// Finds a tenant by name and host.
    async fn find_tenant(&self, name: &str, host: &str) -> AppResult<Option<StoredTenant>>;

    /// Persists a new tenant.
    async fn create_tenant(&self, tenant: &StoredTenant) -> AppResult<()>;
}
