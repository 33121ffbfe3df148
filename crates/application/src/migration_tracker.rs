//! Schema drift detection after commits.


use interlock_core::{AppResult, Cancellation};
use interlock_domain::{MigrationRecord, ModelSnapshot, ticks_of};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::data_options::DataOptions;
use crate::data_ports::{MigrationStore, ModelSnapshotBuilder};
use crate::identifier_service::StoreIdentifier;

/// Compares the current model snapshot with the latest migration record of
/// one accessor and produces a new record on drift.
///
/// Load, decide and append are serialized per tracker instance so parallel
/// commits through the same accessor append at most one record per model.
pub struct MigrationTracker {
    store_identifier: StoreIdentifier,
    accessor_name: String,
    created_by: String,
    lock: Mutex<()>,
}

impl MigrationTracker {
    /// Creates a tracker for one accessor.
    #[must_use]
    pub fn new(
        store_identifier: StoreIdentifier,
        accessor_name: impl Into<String>,
        options: &DataOptions,
    ) -> Self {
        Self {
            store_identifier,
            accessor_name: accessor_name.into(),
            created_by: options.system_actor.clone(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the accessor whose history is tracked.
    #[must_use]
    pub fn accessor_name(&self) -> &str {
        self.accessor_name.as_str()
    }

    /// Decides whether `existing` needs a new record for the current model.
    ///
    /// Returns the record to append, or `None` when the latest record by
    /// `created_time_ticks` already has the current hash. Nothing is
    /// persisted.
    pub async fn check_and_record(
        &self,
        builder: &dyn ModelSnapshotBuilder,
        existing: &[MigrationRecord],
        cancellation: &Cancellation,
    ) -> AppResult<Option<MigrationRecord>> {
        let _guard = self.lock.lock().await;
        self.decide(builder, existing, cancellation).await
    }

    /// Loads the history from `store`, decides and appends on drift.
    pub async fn track(
        &self,
        builder: &dyn ModelSnapshotBuilder,
        store: &dyn MigrationStore,
        cancellation: &Cancellation,
    ) -> AppResult<Option<MigrationRecord>> {
        let _guard = self.lock.lock().await;
        cancellation.check()?;

        let existing = store.list_migrations(self.accessor_name.as_str()).await?;
        let Some(migration) = self.decide(builder, &existing, cancellation).await? else {
            return Ok(None);
        };

        store.append_migration(&migration).await?;
        info!(
            accessor = %self.accessor_name,
            snapshot = %migration.model_snapshot_name,
            hash = %migration.model_hash,
            "recorded model migration"
        );

        Ok(Some(migration))
    }

    async fn decide(
        &self,
        builder: &dyn ModelSnapshotBuilder,
        existing: &[MigrationRecord],
        cancellation: &Cancellation,
    ) -> AppResult<Option<MigrationRecord>> {
        cancellation.check()?;

        let model_body = builder.build_model_body().await?;
        let snapshot = ModelSnapshot::new(builder.snapshot_name(), model_body);

        if let Some(latest) = MigrationRecord::latest(existing)
            && latest.model_hash == snapshot.hash()
        {
            debug!(accessor = %self.accessor_name, hash = %snapshot.hash(), "model unchanged");
            return Ok(None);
        }

        let id = self.store_identifier.migration_id(cancellation).await?;
        let created_time = self
            .store_identifier
            .clock()
            .utc_now(cancellation)
            .await?;

        Ok(Some(MigrationRecord {
            id,
            accessor_name: self.accessor_name.clone(),
            model_snapshot_name: snapshot.name().to_owned(),
            model_body: snapshot.body().to_owned(),
            model_hash: snapshot.hash().to_owned(),
            created_by: self.created_by.clone(),
            created_time,
            created_time_ticks: ticks_of(created_time),
        }))
    }
}
