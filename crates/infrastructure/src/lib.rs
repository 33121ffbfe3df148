//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_accessor;
mod in_memory_audit_store;
mod in_memory_connection;
mod in_memory_migration_store;
mod in_memory_tenant_store;
mod postgres_audit_store;
mod postgres_connection;
mod postgres_migration_store;
mod postgres_schema_snapshot_builder;
mod postgres_tenant_store;
mod system_clock;
mod tracing_commit_observer;

pub use in_memory_accessor::InMemoryAccessor;
pub use in_memory_audit_store::InMemoryAuditStore;
pub use in_memory_connection::InMemoryConnection;
pub use in_memory_migration_store::InMemoryMigrationStore;
pub use in_memory_tenant_store::InMemoryTenantStore;
pub use postgres_audit_store::PostgresAuditStore;
pub use postgres_connection::PostgresConnection;
pub use postgres_migration_store::PostgresMigrationStore;
pub use postgres_schema_snapshot_builder::PostgresSchemaSnapshotBuilder;
pub use postgres_tenant_store::PostgresTenantStore;
pub use system_clock::SystemClock;
pub use tracing_commit_observer::TracingCommitObserver;

/// Embedded SQL migrations creating the audit, migration and tenant tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
