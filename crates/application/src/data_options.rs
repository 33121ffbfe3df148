//! Explicit configuration passed into every pipeline service.

use chrono::{DateTime, Utc};
use interlock_domain::{DataStatus, EntityState, IdentifierKind, Tenant};

/// Identifier generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierStrategy {
    /// Time-ordered GUID with random suffix.
    #[default]
    CombGuid,
    /// Process-local incrementing integer.
    IncrementalLong,
    /// Time-ordered GUID formatted as text.
    StringToken,
}

impl IdentifierStrategy {
    /// Returns the identifier family produced by this strategy.
    #[must_use]
    pub fn identifier_kind(&self) -> IdentifierKind {
        match self {
            Self::CombGuid => IdentifierKind::Guid,
            Self::IncrementalLong => IdentifierKind::Long,
            Self::StringToken => IdentifierKind::Text,
        }
    }

    /// Parses a configuration value (`comb_guid`, `incremental_long`,
    /// `string_token`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "comb_guid" | "guid" => Some(Self::CombGuid),
            "incremental_long" | "long" => Some(Self::IncrementalLong),
            "string_token" | "string" => Some(Self::StringToken),
            _ => None,
        }
    }
}

/// Defaults applied to newly created entities.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPreferences {
    /// Rank assigned to new ranked entities.
    pub default_rank: f32,
    /// Status assigned to new stateful entities.
    pub default_status: DataStatus,
    /// Creation time override; the clock is used when `None`.
    pub default_created_time: Option<DateTime<Utc>>,
}

impl Default for DataPreferences {
    fn default() -> Self {
        Self {
            default_rank: 1.0,
            default_status: DataStatus::Active,
            default_created_time: None,
        }
    }
}

/// Configuration of the save interception pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DataOptions {
    /// Gates tenant connection switching around commits.
    pub tenant_enabled: bool,
    /// Gates audit capture before commits.
    pub audit_enabled: bool,
    /// Gates schema drift tracking after commits.
    pub migration_enabled: bool,
    /// Creates the target database before opening a switched connection.
    pub ensure_database: bool,
    /// Identifier generation strategy.
    pub identifier_strategy: IdentifierStrategy,
    /// Entity states captured by the audit recorder.
    pub audited_states: Vec<EntityState>,
    /// Subject recorded when no entity metadata names one.
    pub system_actor: String,
    /// Tenant used when no other resolver is configured.
    pub default_tenant: Option<Tenant>,
    /// Defaults for new entities.
    pub preferences: DataPreferences,
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            tenant_enabled: false,
            audit_enabled: true,
            migration_enabled: true,
            ensure_database: false,
            identifier_strategy: IdentifierStrategy::default(),
            audited_states: vec![
                EntityState::Added,
                EntityState::Modified,
                EntityState::Deleted,
            ],
            system_actor: "system".to_owned(),
            default_tenant: None,
            preferences: DataPreferences::default(),
        }
    }
}
