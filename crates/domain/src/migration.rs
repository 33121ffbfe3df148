use std::fmt::Write;

use chrono::{DateTime, Utc};
use interlock_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Identifier;

/// Versioned marker of the persistence schema's structural state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Record identifier.
    pub id: Identifier,
    /// Name of the accessor whose model was captured.
    pub accessor_name: String,
    /// Name of the model snapshot.
    pub model_snapshot_name: String,
    /// Canonical model text.
    pub model_body: String,
    /// Lowercase hex SHA-256 of `model_body`.
    pub model_hash: String,
    /// Subject that recorded the migration.
    pub created_by: String,
    /// Time the migration was recorded.
    pub created_time: DateTime<Utc>,
    /// `created_time` as microseconds since the Unix epoch.
    pub created_time_ticks: i64,
}

impl MigrationRecord {
    /// Returns the most recently created record.
    #[must_use]
    pub fn latest(records: &[Self]) -> Option<&Self> {
        records
            .iter()
            .max_by_key(|record| record.created_time_ticks)
    }
}

/// Converts a timestamp into migration ticks.
#[must_use]
pub fn ticks_of(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

/// Canonical model text and its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSnapshot {
    name: String,
    body: String,
    hash: String,
}

impl ModelSnapshot {
    /// Creates a snapshot and hashes its body.
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let hash = hash_model_body(body.as_str());
        Self {
            name: name.into(),
            body,
            hash,
        }
    }

    /// Returns the snapshot name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the canonical model text.
    #[must_use]
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Returns the lowercase hex SHA-256 of the body.
    #[must_use]
    pub fn hash(&self) -> &str {
        self.hash.as_str()
    }
}

/// Computes the lowercase hex SHA-256 of a model body.
#[must_use]
pub fn hash_model_body(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

/// Structural description of the persisted model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    /// Mapped entity types.
    pub entities: Vec<EntityModel>,
}

/// Structural description of one mapped entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityModel {
    /// Logical entity type name.
    pub name: String,
    /// Mapped table name.
    pub table: String,
    /// Mapped table schema.
    pub schema: Option<String>,
    /// Columns in declaration order.
    pub properties: Vec<PropertyModel>,
}

/// Structural description of one mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyModel {
    /// Property name.
    pub name: String,
    /// Store type name.
    pub type_name: String,
    /// Column accepts null.
    pub nullable: bool,
    /// Column is part of the primary key.
    pub is_primary_key: bool,
    /// Column is an optimistic concurrency token.
    pub is_concurrency_token: bool,
    /// Maximum length for bounded types.
    pub max_length: Option<u32>,
}

impl PropertyModel {
    /// Creates a non-key column description.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
            is_primary_key: false,
            is_concurrency_token: false,
            max_length: None,
        }
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as a concurrency token.
    #[must_use]
    pub fn concurrency_token(mut self) -> Self {
        self.is_concurrency_token = true;
        self
    }

    /// Bounds the column length.
    #[must_use]
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

impl DataModel {
    /// Serializes the model into canonical text.
    ///
    /// Entities are ordered by name so registration order does not affect
    /// the hash; column order is structural and kept as declared.
    pub fn canonical_body(&self) -> AppResult<String> {
        let mut canonical = self.clone();
        canonical
            .entities
            .sort_by(|left, right| left.name.cmp(&right.name));

        serde_json::to_string_pretty(&canonical).map_err(|error| {
            AppError::Internal(format!("failed to serialize model snapshot: {error}"))
        })
    }
}
