//! Ports implemented by persistence adapters.

mod accessor;
mod clock;
mod connection;
mod observer;
mod snapshot;
mod stores;
mod tenant;

pub use accessor::Accessor;
pub use clock::Clock;
pub use connection::{ConnectionState, DataConnection};
pub use observer::CommitObserver;
pub use snapshot::ModelSnapshotBuilder;
pub use stores::{AuditStore, MigrationStore, TenantStore};
pub use tenant::TenantResolver;
