use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use interlock_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Identifier;

/// Logical customer or environment partition with its own connection target.
///
/// Two tenants are equal when their name and host match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    name: NonEmptyString,
    host: NonEmptyString,
    default_connection_string: String,
    write_connection_string: String,
    write_connection_separation: bool,
}

impl Tenant {
    /// Creates a tenant that reads and writes through one connection.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        default_connection_string: impl Into<String>,
    ) -> AppResult<Self> {
        let default_connection_string = default_connection_string.into();
        Ok(Self {
            name: NonEmptyString::new(name)?,
            host: NonEmptyString::new(host)?,
            write_connection_string: default_connection_string.clone(),
            default_connection_string,
            write_connection_separation: false,
        })
    }

    /// Routes writes to a separate connection string.
    #[must_use]
    pub fn with_write_connection(mut self, write_connection_string: impl Into<String>) -> Self {
        self.write_connection_string = write_connection_string.into();
        self.write_connection_separation = true;
        self
    }

    /// Restores every field from stored values.
    pub fn from_parts(
        name: impl Into<String>,
        host: impl Into<String>,
        default_connection_string: impl Into<String>,
        write_connection_string: impl Into<String>,
        write_connection_separation: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            host: NonEmptyString::new(host)?,
            default_connection_string: default_connection_string.into(),
            write_connection_string: write_connection_string.into(),
            write_connection_separation,
        })
    }

    /// Returns the tenant name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the tenant host.
    #[must_use]
    pub fn host(&self) -> &NonEmptyString {
        &self.host
    }

    /// Returns the connection string used for reads.
    #[must_use]
    pub fn default_connection_string(&self) -> &str {
        self.default_connection_string.as_str()
    }

    /// Returns the connection string used for writes.
    #[must_use]
    pub fn write_connection_string(&self) -> &str {
        self.write_connection_string.as_str()
    }

    /// Returns whether writes use a separate connection.
    #[must_use]
    pub fn write_connection_separation(&self) -> bool {
        self.write_connection_separation
    }
}

impl PartialEq for Tenant {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.host == other.host
    }
}

impl Eq for Tenant {}

impl Hash for Tenant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.host.hash(state);
    }
}

/// Persisted tenant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTenant {
    /// Row identifier.
    pub id: Identifier,
    /// Tenant values.
    pub tenant: Tenant,
    /// Time the row was created.
    pub created_time: DateTime<Utc>,
}
