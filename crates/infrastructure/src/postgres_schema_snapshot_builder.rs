use std::collections::BTreeMap;

use async_trait::async_trait;
use interlock_application::{ModelSnapshotBuilder, snapshot_name_for};
use interlock_core::{AppError, AppResult};
use interlock_domain::{DataModel, EntityModel, PropertyModel};
use sqlx::{FromRow, PgPool};

/// Builds model snapshots from the live PostgreSQL catalog.
///
/// Every user table is captured except the migrator's own bookkeeping table.
#[derive(Clone)]
pub struct PostgresSchemaSnapshotBuilder {
    pool: PgPool,
    accessor_name: String,
}

impl PostgresSchemaSnapshotBuilder {
    /// Creates a builder reading the catalog through `pool`.
    #[must_use]
    pub fn new(pool: PgPool, accessor_name: impl Into<String>) -> Self {
        Self {
            pool,
            accessor_name: accessor_name.into(),
        }
    }

    /// Reads the current catalog into a model description.
    pub async fn load_model(&self) -> AppResult<DataModel> {
        let rows = sqlx::query_as::<_, ColumnRow>(
            r#"
            SELECT
                columns.table_schema::TEXT AS table_schema,
                columns.table_name::TEXT AS table_name,
                columns.column_name::TEXT AS column_name,
                columns.data_type::TEXT AS data_type,
                columns.is_nullable::TEXT = 'YES' AS nullable,
                columns.character_maximum_length::INT4 AS max_length,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints constraints
                    INNER JOIN information_schema.key_column_usage usage
                        ON usage.constraint_schema = constraints.constraint_schema
                       AND usage.constraint_name = constraints.constraint_name
                    WHERE constraints.constraint_type = 'PRIMARY KEY'
                      AND usage.table_schema = columns.table_schema
                      AND usage.table_name = columns.table_name
                      AND usage.column_name = columns.column_name
                ) AS is_primary_key
            FROM information_schema.columns columns
            INNER JOIN information_schema.tables tables
                ON tables.table_schema = columns.table_schema
               AND tables.table_name = columns.table_name
            WHERE tables.table_type = 'BASE TABLE'
              AND columns.table_schema NOT IN ('pg_catalog', 'information_schema')
              AND columns.table_name <> '_sqlx_migrations'
            ORDER BY columns.table_schema, columns.table_name, columns.ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read schema catalog: {error}")))?;

        Ok(model_from_columns(rows))
    }
}

#[derive(Debug, FromRow)]
struct ColumnRow {
    table_schema: String,
    table_name: String,
    column_name: String,
    data_type: String,
    nullable: bool,
    max_length: Option<i32>,
    is_primary_key: bool,
}

fn model_from_columns(rows: Vec<ColumnRow>) -> DataModel {
    let mut entities: BTreeMap<(String, String), EntityModel> = BTreeMap::new();

    for row in rows {
        let mut property = PropertyModel::new(row.column_name, row.data_type, row.nullable);
        if row.is_primary_key {
            property = property.primary_key();
        }
        if let Some(max_length) = row.max_length.and_then(|length| u32::try_from(length).ok()) {
            property = property.max_length(max_length);
        }

        entities
            .entry((row.table_schema.clone(), row.table_name.clone()))
            .or_insert_with(|| EntityModel {
                name: format!("{}.{}", row.table_schema, row.table_name),
                table: row.table_name,
                schema: Some(row.table_schema),
                properties: Vec::new(),
            })
            .properties
            .push(property);
    }

    DataModel {
        entities: entities.into_values().collect(),
    }
}

#[async_trait]
impl ModelSnapshotBuilder for PostgresSchemaSnapshotBuilder {
    fn snapshot_name(&self) -> String {
        snapshot_name_for(self.accessor_name.as_str())
    }

    async fn build_model_body(&self) -> AppResult<String> {
        self.load_model().await?.canonical_body()
    }
}
