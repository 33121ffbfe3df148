use std::str::FromStr;

use chrono::{DateTime, Utc};
use interlock_core::AppError;
use serde::{Deserialize, Serialize};

use crate::Identifier;

/// Lifecycle status stored on stateful entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    /// Status was never assigned.
    #[default]
    Default,
    /// Entity is live.
    Active,
    /// Entity is hidden but retained.
    Inactive,
    /// Entity is locked against edits.
    Locking,
    /// Entity is logically deleted.
    Delete,
}

impl DataStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Locking => "locking",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for DataStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "locking" => Ok(Self::Locking),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!("unknown data status '{value}'"))),
        }
    }
}

/// Entity carrying a primary identifier.
pub trait Identifiable {
    /// Returns the entity identifier.
    fn id(&self) -> &Identifier;

    /// Replaces the entity identifier.
    fn set_id(&mut self, id: Identifier);
}

/// Entity carrying creation metadata.
pub trait Creatable {
    /// Returns the subject that created the entity, if recorded.
    fn created_by(&self) -> Option<&str>;

    /// Returns the creation timestamp, if recorded.
    fn created_time(&self) -> Option<DateTime<Utc>>;

    /// Records the creating subject.
    fn set_created_by(&mut self, created_by: String);

    /// Records the creation timestamp.
    fn set_created_time(&mut self, created_time: DateTime<Utc>);
}

/// Entity carrying last-update metadata.
pub trait Updatable {
    /// Returns the subject that last updated the entity, if recorded.
    fn updated_by(&self) -> Option<&str>;

    /// Returns the last update timestamp, if recorded.
    fn updated_time(&self) -> Option<DateTime<Utc>>;

    /// Records the updating subject.
    fn set_updated_by(&mut self, updated_by: String);

    /// Records the update timestamp.
    fn set_updated_time(&mut self, updated_time: DateTime<Utc>);
}

/// Entity with a sortable rank.
pub trait Ranked {
    /// Returns the rank.
    fn rank(&self) -> f32;

    /// Replaces the rank.
    fn set_rank(&mut self, rank: f32);
}

/// Entity with a lifecycle status.
pub trait Stateful {
    /// Returns the status.
    fn status(&self) -> DataStatus;

    /// Replaces the status.
    fn set_status(&mut self, status: DataStatus);
}
