use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interlock_application::AuditStore;
use interlock_core::{AppError, AppResult};
use interlock_domain::{AuditPropertyRecord, AuditRecord, EntityState, Identifier, IdentifierKind};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed append-only audit store.
#[derive(Clone)]
pub struct PostgresAuditStore {
    pool: PgPool,
    identifier_kind: IdentifierKind,
}

impl PostgresAuditStore {
    /// Creates a store with the provided connection pool.
    ///
    /// Stored identifiers are read back as `identifier_kind`.
    #[must_use]
    pub fn new(pool: PgPool, identifier_kind: IdentifierKind) -> Self {
        Self {
            pool,
            identifier_kind,
        }
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    id: String,
    entity_type_name: String,
    entity_id: Option<String>,
    table_name: String,
    state: i16,
    state_name: String,
    created_by: String,
    created_time: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AuditPropertyRow {
    id: String,
    audit_id: String,
    property_name: String,
    property_type_name: String,
    old_value: Option<String>,
    new_value: Option<String>,
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn append_audits(&self, audits: &[AuditRecord]) -> AppResult<()> {
        if audits.is_empty() {
            return Ok(());
        }

        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        for audit in audits {
            sqlx::query(
                r#"
                INSERT INTO data_audits (
                    id,
                    entity_type_name,
                    entity_id,
                    table_name,
                    state,
                    state_name,
                    created_by,
                    created_time
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(audit.id.to_string())
            .bind(audit.entity_type_name.as_str())
            .bind(audit.entity_id.as_deref())
            .bind(audit.table_name.as_str())
            .bind(audit.state.code())
            .bind(audit.state_name.as_str())
            .bind(audit.created_by.as_str())
            .bind(audit.created_time)
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to append audit: {error}")))?;

            for (ordinal, property) in audit.properties.iter().enumerate() {
                let ordinal = i32::try_from(ordinal).map_err(|error| {
                    AppError::Internal(format!("audit property ordinal overflow: {error}"))
                })?;

                sqlx::query(
                    r#"
                    INSERT INTO data_audit_properties (
                        id,
                        audit_id,
                        ordinal,
                        property_name,
                        property_type_name,
                        old_value,
                        new_value
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(property.id.to_string())
                .bind(property.audit_id.to_string())
                .bind(ordinal)
                .bind(property.property_name.as_str())
                .bind(property.property_type_name.as_str())
                .bind(property.old_value.as_deref())
                .bind(property.new_value.as_deref())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to append audit property: {error}"))
                })?;
            }
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn list_audits_for_entity(
        &self,
        entity_type_name: &str,
        entity_id: &str,
    ) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT
                id,
                entity_type_name,
                entity_id,
                table_name,
                state,
                state_name,
                created_by,
                created_time
            FROM data_audits
            WHERE entity_type_name = $1 AND entity_id = $2
            ORDER BY created_time, id
            "#,
        )
        .bind(entity_type_name)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audits: {error}")))?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let audit_ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let property_rows = sqlx::query_as::<_, AuditPropertyRow>(
            r#"
            SELECT
                id,
                audit_id,
                property_name,
                property_type_name,
                old_value,
                new_value
            FROM data_audit_properties
            WHERE audit_id = ANY($1)
            ORDER BY audit_id, ordinal
            "#,
        )
        .bind(audit_ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit properties: {error}"))
        })?;

        let mut properties_by_audit: HashMap<String, Vec<AuditPropertyRecord>> = HashMap::new();
        for row in property_rows {
            let property = AuditPropertyRecord {
                id: self.parse_id(row.id.as_str())?,
                audit_id: self.parse_id(row.audit_id.as_str())?,
                property_name: row.property_name,
                property_type_name: row.property_type_name,
                old_value: row.old_value,
                new_value: row.new_value,
            };
            properties_by_audit
                .entry(row.audit_id)
                .or_default()
                .push(property);
        }

        rows.into_iter()
            .map(|row| {
                let state = EntityState::from_code(row.state)?;
                Ok(AuditRecord {
                    id: self.parse_id(row.id.as_str())?,
                    properties: properties_by_audit.remove(&row.id).unwrap_or_default(),
                    entity_type_name: row.entity_type_name,
                    entity_id: row.entity_id,
                    table_name: row.table_name,
                    state,
                    state_name: row.state_name,
                    created_by: row.created_by,
                    created_time: row.created_time,
                })
            })
            .collect()
    }
}

impl PostgresAuditStore {
    fn parse_id(&self, value: &str) -> AppResult<Identifier> {
        Identifier::parse_as(self.identifier_kind, value).map_err(|error| {
            AppError::Internal(format!("persisted audit identifier is invalid: {error}"))
        })
    }
}
