use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interlock_application::TenantStore;
use interlock_core::{AppError, AppResult};
use interlock_domain::{Identifier, IdentifierKind, StoredTenant, Tenant};
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed tenant store.
#[derive(Clone)]
pub struct PostgresTenantStore {
    pool: PgPool,
    identifier_kind: IdentifierKind,
}

impl PostgresTenantStore {
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
struct TenantRow {
    id: String,
    name: String,
    host: String,
    default_connection_string: String,
    write_connection_string: String,
    write_connection_separation: bool,
    created_time: DateTime<Utc>,
}

#[async_trait]
impl TenantStore for PostgresTenantStore {
    async fn contains_tenant(&self, name: &str, host: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM data_tenants
                WHERE name = $1 AND host = $2
            )
            "#,
        )
        .bind(name)
        .bind(host)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check tenant: {error}")))
    }

    async fn find_tenant(&self, name: &str, host: &str) -> AppResult<Option<StoredTenant>> {
        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT
                id,
                name,
                host,
                default_connection_string,
                write_connection_string,
                write_connection_separation,
                created_time
            FROM data_tenants
            WHERE name = $1 AND host = $2
            "#,
        )
        .bind(name)
        .bind(host)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find tenant: {error}")))?;

        row.map(|row| {
            let id = Identifier::parse_as(self.identifier_kind, row.id.as_str());
            let tenant = Tenant::from_parts(
                row.name,
                row.host,
                row.default_connection_string,
                row.write_connection_string,
                row.write_connection_separation,
            );

            match (id, tenant) {
                (Ok(id), Ok(tenant)) => Ok(StoredTenant {
                    id,
                    tenant,
                    created_time: row.created_time,
                }),
                (Err(error), _) | (_, Err(error)) => Err(AppError::Internal(format!(
                    "persisted tenant is invalid: {error}"
                ))),
            }
        })
        .transpose()
    }

    async fn create_tenant(&self, tenant: &StoredTenant) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO data_tenants (
                id,
                name,
                host,
                default_connection_string,
                write_connection_string,
                write_connection_separation,
                created_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tenant.id.to_string())
        .bind(tenant.tenant.name().as_str())
        .bind(tenant.tenant.host().as_str())
        .bind(tenant.tenant.default_connection_string())
        .bind(tenant.tenant.write_connection_string())
        .bind(tenant.tenant.write_connection_separation())
        .bind(tenant.created_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "tenant '{}' on host '{}' already exists",
                        tenant.tenant.name().as_str(),
                        tenant.tenant.host().as_str()
                    )));
                }

                Err(AppError::Internal(format!("failed to create tenant: {error}")))
            }
        }
    }
}
