use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interlock_application::MigrationStore;
use interlock_core::{AppError, AppResult};
use interlock_domain::{Identifier, IdentifierKind, MigrationRecord};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed migration history.
#[derive(Clone)]
pub struct PostgresMigrationStore {
    pool: PgPool,
    identifier_kind: IdentifierKind,
}

impl PostgresMigrationStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool, identifier_kind: IdentifierKind) -> Self {
        Self {
            pool,
            identifier_kind,
        }
    }
}

#[derive(Debug, FromRow)]
struct MigrationRow {
    id: String,
    accessor_name: String,
    model_snapshot_name: String,
    model_body: String,
    model_hash: String,
    created_by: String,
    created_time: DateTime<Utc>,
    created_time_ticks: i64,
}

#[async_trait]
impl MigrationStore for PostgresMigrationStore {
    async fn list_migrations(&self, accessor_name: &str) -> AppResult<Vec<MigrationRecord>> {
        let rows = sqlx::query_as::<_, MigrationRow>(
            r#"
            SELECT
                id,
                accessor_name,
                model_snapshot_name,
                model_body,
                model_hash,
                created_by,
                created_time,
                created_time_ticks
            FROM data_migrations
            WHERE accessor_name = $1
            ORDER BY created_time_ticks, id
            "#,
        )
        .bind(accessor_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list migrations: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let id = Identifier::parse_as(self.identifier_kind, row.id.as_str()).map_err(
                    |error| {
                        AppError::Internal(format!(
                            "persisted migration identifier is invalid: {error}"
                        ))
                    },
                )?;

                Ok(MigrationRecord {
                    id,
                    accessor_name: row.accessor_name,
                    model_snapshot_name: row.model_snapshot_name,
                    model_body: row.model_body,
                    model_hash: row.model_hash,
                    created_by: row.created_by,
                    created_time: row.created_time,
                    created_time_ticks: row.created_time_ticks,
                })
            })
            .collect()
    }

    async fn append_migration(&self, migration: &MigrationRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO data_migrations (
                id,
                accessor_name,
                model_snapshot_name,
                model_body,
                model_hash,
                created_by,
                created_time,
                created_time_ticks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(migration.id.to_string())
        .bind(migration.accessor_name.as_str())
        .bind(migration.model_snapshot_name.as_str())
        .bind(migration.model_body.as_str())
        .bind(migration.model_hash.as_str())
        .bind(migration.created_by.as_str())
        .bind(migration.created_time)
        .bind(migration.created_time_ticks)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append migration: {error}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use interlock_application::MigrationStore;
    use interlock_domain::{Identifier, IdentifierKind, MigrationRecord, hash_model_body, ticks_of};
    use sqlx::PgPool;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::PostgresMigrationStore;
    use crate::MIGRATOR;

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres migration tests: {error}");
        }

        Some(pool)
    }

    #[tokio::test]
    async fn migrations_are_scoped_to_their_accessor() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let store = PostgresMigrationStore::new(pool, IdentifierKind::Guid);
        let accessor_name = format!("Accessor{}", Uuid::new_v4().simple());
        let created_time = Utc::now();
        let migration = MigrationRecord {
            id: Identifier::from_guid(Uuid::new_v4()),
            accessor_name: accessor_name.clone(),
            model_snapshot_name: format!("{accessor_name}ModelSnapshot"),
            model_body: "{}".to_owned(),
            model_hash: hash_model_body("{}"),
            created_by: "system".to_owned(),
            created_time,
            created_time_ticks: ticks_of(created_time),
        };

        assert!(store.append_migration(&migration).await.is_ok());
        let listed = store.list_migrations(&accessor_name).await;
        let other = store.list_migrations("SomeOtherAccessor-not-used").await;

        assert!(listed.is_ok_and(|listed| listed.len() == 1 && listed[0].id == migration.id));
        assert!(other.is_ok_and(|other| other.is_empty()));
    }

    #[tokio::test]
    async fn migrations_sharing_a_tick_are_listed_by_id() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let store = PostgresMigrationStore::new(pool, IdentifierKind::Guid);
        let accessor_name = format!("Accessor{}", Uuid::new_v4().simple());
        let created_time = Utc::now();
        let mut ids = [
            Identifier::from_guid(Uuid::new_v4()),
            Identifier::from_guid(Uuid::new_v4()),
        ];
        ids.sort_by_key(ToString::to_string);

        for id in ids.iter().rev() {
            let migration = MigrationRecord {
                id: id.clone(),
                accessor_name: accessor_name.clone(),
                model_snapshot_name: format!("{accessor_name}ModelSnapshot"),
                model_body: "{}".to_owned(),
                model_hash: hash_model_body("{}"),
                created_by: "system".to_owned(),
                created_time,
                created_time_ticks: ticks_of(created_time),
            };
            assert!(store.append_migration(&migration).await.is_ok());
        }

        let listed = store.list_migrations(&accessor_name).await.unwrap_or_default();
        let listed_ids: Vec<Identifier> = listed.into_iter().map(|record| record.id).collect();

        assert_eq!(listed_ids, ids.to_vec());
    }
}
