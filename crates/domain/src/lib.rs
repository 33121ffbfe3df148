//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod capability;
mod change;
mod identifier;
mod migration;
mod policy;
mod tenant;

pub use audit::{AuditPropertyRecord, AuditRecord};
pub use capability::{Creatable, DataStatus, Identifiable, Ranked, Stateful, Updatable};
pub use change::{ChangeEntry, EntityState, PropertyEntry, PropertyValue, TrackedEntity};
pub use identifier::{Identifier, IdentifierKind};
pub use migration::{
    DataModel, EntityModel, MigrationRecord, ModelSnapshot, PropertyModel, hash_model_body,
    ticks_of,
};
pub use policy::{
    AUDIT_ENTITY_TYPE, AUDIT_PROPERTY_ENTITY_TYPE, EntityPolicies, EntityPolicy,
    MIGRATION_ENTITY_TYPE,
};
pub use tenant::{StoredTenant, Tenant};
