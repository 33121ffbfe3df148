use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntityState, Identifier};

/// Immutable audit entry describing one entity change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record identifier.
    pub id: Identifier,
    /// Logical entity type name.
    pub entity_type_name: String,
    /// Formatted primary key of the audited entity.
    pub entity_id: Option<String>,
    /// Qualified table name.
    pub table_name: String,
    /// Tracking state captured at commit time.
    pub state: EntityState,
    /// Display name of `state`.
    pub state_name: String,
    /// Subject responsible for the change.
    pub created_by: String,
    /// Time of the change.
    pub created_time: DateTime<Utc>,
    /// Field-level changes in declaration order.
    pub properties: Vec<AuditPropertyRecord>,
}

impl AuditRecord {
    /// Returns true when any property carries an original value.
    #[must_use]
    pub fn has_old_values(&self) -> bool {
        self.properties
            .iter()
            .any(|property| property.old_value.as_deref().is_some_and(|value| !value.is_empty()))
    }

    /// Finds a property change by name.
    #[must_use]
    pub fn property(&self, property_name: &str) -> Option<&AuditPropertyRecord> {
        self.properties
            .iter()
            .find(|property| property.property_name == property_name)
    }
}

/// Field-level change belonging to one audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPropertyRecord {
    /// Record identifier.
    pub id: Identifier,
    /// Identifier of the owning audit record.
    pub audit_id: Identifier,
    /// Property name.
    pub property_name: String,
    /// Property type name.
    pub property_type_name: String,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
}

impl AuditPropertyRecord {
    /// Returns true when the change carries neither value.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.old_value.is_none() && self.new_value.is_none()
    }
}
