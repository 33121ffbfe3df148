use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use interlock_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{Creatable, Updatable};

/// Change-tracking state of one entity during a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    /// Entity is tracked without pending changes.
    Unchanged,
    /// Entity will be inserted.
    Added,
    /// Entity will be updated.
    Modified,
    /// Entity will be removed.
    Deleted,
}

impl EntityState {
    /// Returns the stable numeric code persisted with audit records.
    #[must_use]
    pub fn code(&self) -> i16 {
        match self {
            Self::Unchanged => 1,
            Self::Deleted => 2,
            Self::Modified => 3,
            Self::Added => 4,
        }
    }

    /// Returns the display name persisted with audit records.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unchanged => "Unchanged",
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
        }
    }

    /// Resolves a persisted numeric code.
    pub fn from_code(code: i16) -> Result<Self, AppError> {
        match code {
            1 => Ok(Self::Unchanged),
            2 => Ok(Self::Deleted),
            3 => Ok(Self::Modified),
            4 => Ok(Self::Added),
            _ => Err(AppError::Validation(format!(
                "unknown entity state code '{code}'"
            ))),
        }
    }
}

impl FromStr for EntityState {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Unchanged" => Ok(Self::Unchanged),
            "Added" => Ok(Self::Added),
            "Modified" => Ok(Self::Modified),
            "Deleted" => Ok(Self::Deleted),
            _ => Err(AppError::Validation(format!(
                "unknown entity state '{value}'"
            ))),
        }
    }
}

/// Current value of one entity property as reported by the entity itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    /// Property name.
    pub name: String,
    /// Property type name.
    pub type_name: String,
    /// Formatted value, `None` for null.
    pub value: Option<String>,
    /// Property is part of the primary key.
    pub is_primary_key: bool,
    /// Property is an optimistic concurrency token.
    pub is_concurrency_token: bool,
}

impl PropertyValue {
    /// Creates a plain property value.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value,
            is_primary_key: false,
            is_concurrency_token: false,
        }
    }

    /// Marks the property as part of the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Marks the property as a concurrency token.
    #[must_use]
    pub fn concurrency_token(mut self) -> Self {
        self.is_concurrency_token = true;
        self
    }
}

/// Entity instance observed by a change tracker.
///
/// Capability views default to `None`; entity types that carry creation or
/// update metadata override them so audit capture can read it without
/// inspecting concrete types.
pub trait TrackedEntity: Debug + Send + Sync {
    /// Returns the logical entity type name.
    fn entity_type_name(&self) -> &str;

    /// Returns the mapped table name.
    fn table_name(&self) -> &str;

    /// Returns the mapped table schema, if any.
    fn table_schema(&self) -> Option<&str> {
        None
    }

    /// Returns current property values in declaration order.
    fn property_values(&self) -> Vec<PropertyValue>;

    /// Returns the creation metadata view.
    fn as_creatable(&self) -> Option<&dyn Creatable> {
        None
    }

    /// Returns the update metadata view.
    fn as_updatable(&self) -> Option<&dyn Updatable> {
        None
    }
}

/// Original and current value of one property inside a change entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    /// Property name.
    pub name: String,
    /// Property type name.
    pub type_name: String,
    /// Value loaded from the store, `None` for new entities or null.
    pub original_value: Option<String>,
    /// Value about to be written, `None` for null.
    pub current_value: Option<String>,
    /// Property is part of the primary key.
    pub is_primary_key: bool,
    /// Property is an optimistic concurrency token.
    pub is_concurrency_token: bool,
}

/// Transient view of one changed entity during a commit.
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    /// Logical entity type name.
    pub entity_type_name: String,
    /// Mapped table name.
    pub table_name: String,
    /// Mapped table schema, if any.
    pub table_schema: Option<String>,
    /// Tracking state.
    pub state: EntityState,
    /// Properties in declaration order.
    pub properties: Vec<PropertyEntry>,
    /// Entity instance, when the tracker exposes it.
    pub entity: Option<Arc<dyn TrackedEntity>>,
}

impl ChangeEntry {
    /// Builds an entry from a tracked entity and the values last loaded from
    /// the store.
    ///
    /// Added entities have no original values. Deleted or modified entities
    /// without a loaded snapshot use their current values as originals.
    #[must_use]
    pub fn track(
        state: EntityState,
        entity: Arc<dyn TrackedEntity>,
        original: Option<&[PropertyValue]>,
    ) -> Self {
        let properties = entity
            .property_values()
            .into_iter()
            .map(|current| {
                let original_value = match state {
                    EntityState::Added => None,
                    _ => original
                        .and_then(|values| values.iter().find(|value| value.name == current.name))
                        .map_or_else(|| current.value.clone(), |value| value.value.clone()),
                };

                PropertyEntry {
                    name: current.name,
                    type_name: current.type_name,
                    original_value,
                    current_value: current.value,
                    is_primary_key: current.is_primary_key,
                    is_concurrency_token: current.is_concurrency_token,
                }
            })
            .collect();

        Self {
            entity_type_name: entity.entity_type_name().to_owned(),
            table_name: entity.table_name().to_owned(),
            table_schema: entity.table_schema().map(str::to_owned),
            state,
            properties,
            entity: Some(entity),
        }
    }

    /// Returns the formatted primary key value.
    ///
    /// Deleted entries report the original value, all others the current
    /// value. Composite keys are joined with `,`.
    #[must_use]
    pub fn primary_key_value(&self) -> Option<String> {
        let parts: Vec<String> = self
            .properties
            .iter()
            .filter(|property| property.is_primary_key)
            .filter_map(|property| match self.state {
                EntityState::Deleted => property.original_value.clone(),
                _ => property.current_value.clone(),
            })
            .collect();

        (!parts.is_empty()).then(|| parts.join(","))
    }

    /// Returns `schema.table`, or the bare table name without a schema.
    #[must_use]
    pub fn qualified_table_name(&self) -> String {
        match self.table_schema.as_deref() {
            Some(schema) if !schema.is_empty() => format!("{schema}.{}", self.table_name),
            _ => self.table_name.clone(),
        }
    }
}
