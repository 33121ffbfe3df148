//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_recorder;
mod data_options;
mod data_ports;
mod default_tenant_resolver;
mod entity_populator;
mod identifier_service;
mod migration_tracker;
mod model_snapshot_builder;
mod save_pipeline;
mod store_initializer;
mod tenant_connection_switcher;

#[cfg(test)]
mod test_support;

pub use audit_recorder::AuditRecorder;
pub use data_options::{DataOptions, DataPreferences, IdentifierStrategy};
pub use data_ports::{
    Accessor, AuditStore, Clock, CommitObserver, ConnectionState, DataConnection, MigrationStore,
    ModelSnapshotBuilder, TenantResolver, TenantStore,
};
pub use default_tenant_resolver::DefaultTenantResolver;
pub use entity_populator::EntityPopulator;
pub use identifier_service::{
    CombGuidGenerator, IdentifierGenerator, IdentifierPurpose, IncrementalLongGenerator,
    StoreIdentifier, StringTokenGenerator, build_identifier_generator,
};
pub use migration_tracker::MigrationTracker;
pub use model_snapshot_builder::{CanonicalModelSnapshotBuilder, snapshot_name_for};
pub use save_pipeline::{PipelineDependencies, PipelineStage, SaveInterceptionPipeline};
pub use store_initializer::StoreInitializer;
pub use tenant_connection_switcher::{SwitchOutcome, TenantConnectionSwitcher};
