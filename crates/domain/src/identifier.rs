use std::fmt::{Display, Formatter};
use std::str::FromStr;

use interlock_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Family of identifier values a store is configured to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// 128-bit GUID-like values.
    Guid,
    /// Monotonic 64-bit integers.
    Long,
    /// Opaque text tokens.
    Text,
}

impl IdentifierKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guid => "guid",
            Self::Long => "long",
            Self::Text => "text",
        }
    }
}

impl FromStr for IdentifierKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "guid" => Ok(Self::Guid),
            "long" => Ok(Self::Long),
            "text" => Ok(Self::Text),
            _ => Err(AppError::Validation(format!(
                "unknown identifier kind '{value}'"
            ))),
        }
    }
}

/// Opaque, comparable identifier of an entity instance or record.
///
/// Conversions are explicit: use [`Identifier::parse_as`] or
/// [`Identifier::try_parse_as`] to read a stored value back and
/// [`Display`] to format one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identifier {
    /// GUID-like value.
    Guid(Uuid),
    /// Integer value.
    Long(i64),
    /// Text token.
    Text(String),
}

impl Identifier {
    /// Wraps a GUID value.
    #[must_use]
    pub fn from_guid(value: Uuid) -> Self {
        Self::Guid(value)
    }

    /// Wraps an integer value.
    #[must_use]
    pub fn from_long(value: i64) -> Self {
        Self::Long(value)
    }

    /// Wraps a text token after validating it is not blank.
    pub fn from_text(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "identifier text must not be empty".to_owned(),
            ));
        }

        Ok(Self::Text(value))
    }

    /// Returns the identifier family.
    #[must_use]
    pub fn kind(&self) -> IdentifierKind {
        match self {
            Self::Guid(_) => IdentifierKind::Guid,
            Self::Long(_) => IdentifierKind::Long,
            Self::Text(_) => IdentifierKind::Text,
        }
    }

    /// Returns the GUID value when this is a GUID identifier.
    #[must_use]
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Self::Guid(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value when this is an integer identifier.
    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }

    /// Parses a formatted identifier of the given kind.
    pub fn parse_as(kind: IdentifierKind, value: &str) -> AppResult<Self> {
        match kind {
            IdentifierKind::Guid => Uuid::parse_str(value)
                .map(Self::Guid)
                .map_err(|error| AppError::Validation(format!("invalid guid '{value}': {error}"))),
            IdentifierKind::Long => value
                .parse::<i64>()
                .map(Self::Long)
                .map_err(|error| {
                    AppError::Validation(format!("invalid long identifier '{value}': {error}"))
                }),
            IdentifierKind::Text => Self::from_text(value),
        }
    }

    /// Parses a formatted identifier, returning `None` when malformed.
    #[must_use]
    pub fn try_parse_as(kind: IdentifierKind, value: &str) -> Option<Self> {
        Self::parse_as(kind, value).ok()
    }
}

impl Display for Identifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guid(value) => write!(formatter, "{value}"),
            Self::Long(value) => write!(formatter, "{value}"),
            Self::Text(value) => formatter.write_str(value),
        }
    }
}
