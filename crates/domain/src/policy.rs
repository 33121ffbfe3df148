use std::collections::HashMap;

/// Policy flags registered for one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityPolicy {
    /// Changes to this type are never audited.
    pub not_audited: bool,
    /// Rows of this type may be partitioned across stores.
    pub shardable: bool,
}

/// Registration table mapping entity type names to policy flags.
///
/// Built once at startup and queried by ordinary lookup. Audit and
/// migration record types are registered as not audited by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPolicies {
    policies: HashMap<String, EntityPolicy>,
}

/// Entity type name of persisted audit records.
pub const AUDIT_ENTITY_TYPE: &str = "AuditRecord";
/// Entity type name of persisted audit property records.
pub const AUDIT_PROPERTY_ENTITY_TYPE: &str = "AuditPropertyRecord";
/// Entity type name of persisted migration records.
pub const MIGRATION_ENTITY_TYPE: &str = "MigrationRecord";

impl EntityPolicies {
    /// Creates a table with the built-in record types registered.
    #[must_use]
    pub fn new() -> Self {
        let mut policies = Self::empty();
        policies.register(
            AUDIT_ENTITY_TYPE,
            EntityPolicy {
                not_audited: true,
                shardable: true,
            },
        );
        policies.register(
            AUDIT_PROPERTY_ENTITY_TYPE,
            EntityPolicy {
                not_audited: true,
                shardable: true,
            },
        );
        policies.register(
            MIGRATION_ENTITY_TYPE,
            EntityPolicy {
                not_audited: true,
                shardable: false,
            },
        );
        policies
    }

    /// Creates a table without any registrations.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Registers or replaces the policy of one entity type.
    pub fn register(&mut self, entity_type_name: impl Into<String>, policy: EntityPolicy) {
        self.policies.insert(entity_type_name.into(), policy);
    }

    /// Registers one entity type as not audited.
    #[must_use]
    pub fn not_audited(mut self, entity_type_name: impl Into<String>) -> Self {
        let entry = self.policies.entry(entity_type_name.into()).or_default();
        entry.not_audited = true;
        self
    }

    /// Registers one entity type as shardable.
    #[must_use]
    pub fn shardable(mut self, entity_type_name: impl Into<String>) -> Self {
        let entry = self.policies.entry(entity_type_name.into()).or_default();
        entry.shardable = true;
        self
    }

    /// Returns the registered policy, or the default policy.
    #[must_use]
    pub fn policy_for(&self, entity_type_name: &str) -> EntityPolicy {
        self.policies
            .get(entity_type_name)
            .copied()
            .unwrap_or_default()
    }

    /// Returns true when changes to the type must not be audited.
    #[must_use]
    pub fn is_not_audited(&self, entity_type_name: &str) -> bool {
        self.policy_for(entity_type_name).not_audited
    }

    /// Returns true when the type may be partitioned.
    #[must_use]
    pub fn is_shardable(&self, entity_type_name: &str) -> bool {
        self.policy_for(entity_type_name).shardable
    }
}

impl Default for EntityPolicies {
    fn default() -> Self {
        Self::new()
    }
}
