use std::sync::Arc;

use interlock_core::{AppResult, Cancellation};
use interlock_domain::{Identifier, IdentifierKind};
use tracing::trace;

use super::IdentifierGenerator;
use crate::data_ports::Clock;

/// Logical purpose of a generated identifier.
///
/// Used for tracing only; it never affects the generated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPurpose {
    /// Audit record key.
    Audit,
    /// Audit property record key.
    AuditProperty,
    /// Migration record key.
    Migration,
    /// Tenant row key.
    Tenant,
}

impl IdentifierPurpose {
    /// Returns the purpose name written to traces.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audit => "AuditId",
            Self::AuditProperty => "AuditPropertyId",
            Self::Migration => "MigrationId",
            Self::Tenant => "TenantId",
        }
    }
}

/// Purpose-tagged identifier façade shared by pipeline services.
#[derive(Clone)]
pub struct StoreIdentifier {
    generator: Arc<dyn IdentifierGenerator>,
    clock: Arc<dyn Clock>,
}

impl StoreIdentifier {
    /// Creates a façade over one generator and clock.
    #[must_use]
    pub fn new(generator: Arc<dyn IdentifierGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { generator, clock }
    }

    /// Returns the clock used for timestamped identifiers.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns the identifier family produced.
    #[must_use]
    pub fn kind(&self) -> IdentifierKind {
        self.generator.kind()
    }

    /// Generates one identifier for the given purpose.
    pub async fn generate(
        &self,
        purpose: IdentifierPurpose,
        cancellation: &Cancellation,
    ) -> AppResult<Identifier> {
        let id = self
            .generator
            .generate(self.clock.as_ref(), cancellation)
            .await?;
        trace!(purpose = purpose.as_str(), id = %id, "generated identifier");
        Ok(id)
    }

    /// Generates an audit record key.
    pub async fn audit_id(&self, cancellation: &Cancellation) -> AppResult<Identifier> {
        self.generate(IdentifierPurpose::Audit, cancellation).await
    }

    /// Generates an audit property record key.
    pub async fn audit_property_id(&self, cancellation: &Cancellation) -> AppResult<Identifier> {
        self.generate(IdentifierPurpose::AuditProperty, cancellation)
            .await
    }

    /// Generates a migration record key.
    pub async fn migration_id(&self, cancellation: &Cancellation) -> AppResult<Identifier> {
        self.generate(IdentifierPurpose::Migration, cancellation)
            .await
    }

    /// Generates a tenant row key.
    pub async fn tenant_id(&self, cancellation: &Cancellation) -> AppResult<Identifier> {
        self.generate(IdentifierPurpose::Tenant, cancellation).await
    }
}
