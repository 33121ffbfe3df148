//! Interlock store tracker: seeds the default tenant and records schema drift.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;

use interlock_application::{
    DataOptions, IdentifierStrategy, MigrationTracker, StoreIdentifier, StoreInitializer,
    build_identifier_generator,
};
use interlock_core::{AppError, AppResult, Cancellation};
use interlock_domain::Tenant;
use interlock_infrastructure::{
    MIGRATOR, PostgresMigrationStore, PostgresSchemaSnapshotBuilder, PostgresTenantStore,
    SystemClock,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct TrackerConfig {
    database_url: String,
    accessor_name: String,
    identifier_strategy: IdentifierStrategy,
    system_actor: String,
    default_tenant: Option<Tenant>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = TrackerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    let options = DataOptions {
        identifier_strategy: config.identifier_strategy,
        system_actor: config.system_actor.clone(),
        default_tenant: config.default_tenant.clone(),
        ..DataOptions::default()
    };
    let identifier_kind = options.identifier_strategy.identifier_kind();
    let store_identifier = StoreIdentifier::new(
        build_identifier_generator(options.identifier_strategy),
        Arc::new(SystemClock::new()),
    );
    let cancellation = Cancellation::new();

    info!(
        accessor = %config.accessor_name,
        identifier_kind = identifier_kind.as_str(),
        "interlock-tracker started"
    );

    let initializer = StoreInitializer::new(
        Arc::new(PostgresTenantStore::new(pool.clone(), identifier_kind)),
        store_identifier.clone(),
        &options,
    );
    if let Some(seeded) = initializer.initialize(&cancellation).await? {
        info!(
            tenant = %seeded.tenant.name().as_str(),
            host = %seeded.tenant.host().as_str(),
            id = %seeded.id,
            "seeded default tenant"
        );
    }

    let tracker = MigrationTracker::new(store_identifier, config.accessor_name.as_str(), &options);
    let builder = PostgresSchemaSnapshotBuilder::new(pool.clone(), config.accessor_name.as_str());
    let store = PostgresMigrationStore::new(pool, identifier_kind);

    match tracker.track(&builder, &store, &cancellation).await? {
        Some(migration) => info!(
            accessor = %migration.accessor_name,
            model_hash = %migration.model_hash,
            "schema drift recorded"
        ),
        None => info!(accessor = %config.accessor_name, "schema unchanged"),
    }

    Ok(())
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Connection(format!("failed to connect to database: {error}")))
}

impl TrackerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let accessor_name =
            optional_env("INTERLOCK_ACCESSOR_NAME").unwrap_or_else(|| "Store".to_owned());
        let identifier_strategy = match optional_env("INTERLOCK_IDENTIFIER_STRATEGY") {
            Some(value) => IdentifierStrategy::parse(value.as_str()).ok_or_else(|| {
                AppError::Validation(format!(
                    "invalid INTERLOCK_IDENTIFIER_STRATEGY value '{value}'"
                ))
            })?,
            None => IdentifierStrategy::default(),
        };
        let system_actor =
            optional_env("INTERLOCK_SYSTEM_ACTOR").unwrap_or_else(|| "system".to_owned());

        let default_tenant = match optional_env("INTERLOCK_DEFAULT_TENANT_NAME") {
            Some(name) => {
                let host = required_env("INTERLOCK_DEFAULT_TENANT_HOST")?;
                let tenant = Tenant::new(name, host, database_url.as_str())?;
                Some(match optional_env("INTERLOCK_WRITE_DATABASE_URL") {
                    Some(write_url) => tenant.with_write_connection(write_url),
                    None => tenant,
                })
            }
            None => None,
        };

        Ok(Self {
            database_url,
            accessor_name,
            identifier_strategy,
            system_actor,
            default_tenant,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
