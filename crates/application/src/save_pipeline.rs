//! Save interception pipeline wrapping one accessor's commit.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use interlock_core::{AppError, AppResult, Cancellation};
use interlock_domain::{AuditRecord, EntityPolicies, MigrationRecord};
use tokio::runtime::{Builder, Handle};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::audit_recorder::AuditRecorder;
use crate::data_options::DataOptions;
use crate::data_ports::{
    Accessor, Clock, CommitObserver, MigrationStore, ModelSnapshotBuilder, TenantResolver,
};
use crate::identifier_service::{StoreIdentifier, build_identifier_generator};
use crate::migration_tracker::MigrationTracker;
use crate::tenant_connection_switcher::TenantConnectionSwitcher;

/// Ordered stages of one intercepted commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Re-target the connection to the tenant write string.
    TenantSwitching,
    /// Capture audit records for pending changes.
    Auditing,
    /// Run the underlying commit.
    Committing,
    /// Compare the model snapshot with the migration history.
    MigrationChecking,
    /// Re-target the connection to the tenant default string.
    TenantRestoring,
}

impl PipelineStage {
    /// Returns the stage name written to traces.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantSwitching => "tenant_switching",
            Self::Auditing => "auditing",
            Self::Committing => "committing",
            Self::MigrationChecking => "migration_checking",
            Self::TenantRestoring => "tenant_restoring",
        }
    }
}

/// Collaborators wired into one pipeline.
#[derive(Clone)]
pub struct PipelineDependencies {
    /// Accessor whose commits are intercepted.
    pub accessor: Arc<dyn Accessor>,
    /// Time source for identifiers and records.
    pub clock: Arc<dyn Clock>,
    /// Resolver of the tenant owning the current scope.
    pub tenant_resolver: Arc<dyn TenantResolver>,
    /// Builder of the accessor's model snapshot.
    pub snapshot_builder: Arc<dyn ModelSnapshotBuilder>,
    /// Migration history of the accessor.
    pub migration_store: Arc<dyn MigrationStore>,
}

/// Orchestrates tenant switching, auditing, commit, migration checking and
/// tenant restoring around one accessor's commit.
///
/// Cancellation is observed between stages only: a stage that started runs
/// to completion. Once the commit succeeded the committed count is returned
/// even if cancellation arrives later.
///
/// Auditing and committing are serialized per pipeline, so the audits staged
/// by one commit always describe exactly the changes that commit saves.
pub struct SaveInterceptionPipeline {
    accessor: Arc<dyn Accessor>,
    options: DataOptions,
    policies: EntityPolicies,
    store_identifier: StoreIdentifier,
    recorder: AuditRecorder,
    tracker: MigrationTracker,
    switcher: TenantConnectionSwitcher,
    snapshot_builder: Arc<dyn ModelSnapshotBuilder>,
    migration_store: Arc<dyn MigrationStore>,
    observers: Vec<Arc<dyn CommitObserver>>,
    commit_lock: Mutex<()>,
}

impl SaveInterceptionPipeline {
    /// Creates a pipeline for one accessor.
    #[must_use]
    pub fn new(
        dependencies: PipelineDependencies,
        options: DataOptions,
        policies: EntityPolicies,
    ) -> Self {
        let store_identifier = StoreIdentifier::new(
            build_identifier_generator(options.identifier_strategy),
            dependencies.clock,
        );
        let recorder = AuditRecorder::new(store_identifier.clone(), &options);
        let tracker = MigrationTracker::new(
            store_identifier.clone(),
            dependencies.accessor.accessor_name(),
            &options,
        );
        let switcher = TenantConnectionSwitcher::new(
            dependencies.tenant_resolver,
            dependencies.accessor.connection(),
            &options,
        );

        Self {
            accessor: dependencies.accessor,
            options,
            policies,
            store_identifier,
            recorder,
            tracker,
            switcher,
            snapshot_builder: dependencies.snapshot_builder,
            migration_store: dependencies.migration_store,
            observers: Vec::new(),
            commit_lock: Mutex::new(()),
        }
    }

    /// Registers an observer notified after successful commits.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CommitObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Returns the identifier façade shared by the pipeline services.
    #[must_use]
    pub fn store_identifier(&self) -> &StoreIdentifier {
        &self.store_identifier
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn options(&self) -> &DataOptions {
        &self.options
    }

    /// Runs one intercepted commit and returns the affected entity count.
    ///
    /// Commit errors are returned unchanged after the tenant connection was
    /// restored.
    pub async fn commit(&self, cancellation: &Cancellation) -> AppResult<u64> {
        // Stages started before cancellation run to completion.
        let stage_cancellation = Cancellation::new();

        let holds_write_target = if self.options.tenant_enabled {
            self.enter(PipelineStage::TenantSwitching, cancellation)?;
            self.switcher
                .switch_for_write(&stage_cancellation)
                .await?
                .holds_write_target()
        } else {
            false
        };

        let result = self
            .commit_on_current_target(cancellation, &stage_cancellation)
            .await;

        if holds_write_target {
            debug!(
                accessor = %self.accessor.accessor_name(),
                stage = PipelineStage::TenantRestoring.as_str(),
                "entering pipeline stage"
            );
            if let Err(error) = self.switcher.restore_default(&stage_cancellation).await {
                warn!(
                    accessor = %self.accessor.accessor_name(),
                    error = %error,
                    "failed to restore tenant default connection"
                );
            }
        }

        result
    }

    /// Runs [`Self::commit`] on a dedicated current-thread runtime.
    ///
    /// Must not be called from inside an async runtime.
    pub fn commit_blocking(&self, cancellation: &Cancellation) -> AppResult<u64> {
        if Handle::try_current().is_ok() {
            return Err(AppError::Internal(
                "commit_blocking must not be called from an async runtime; use commit".to_owned(),
            ));
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build runtime: {error}")))?;

        runtime.block_on(self.commit(cancellation))
    }

    async fn commit_on_current_target(
        &self,
        cancellation: &Cancellation,
        stage_cancellation: &Cancellation,
    ) -> AppResult<u64> {
        let commit_guard = self.commit_lock.lock().await;

        let mut audits = Vec::new();
        if self.options.audit_enabled {
            self.enter(PipelineStage::Auditing, cancellation)?;
            audits = self.capture_audits(stage_cancellation).await?;
        }

        if let Err(error) = self.enter(PipelineStage::Committing, cancellation) {
            if !audits.is_empty() {
                self.discard_staged_audits().await;
            }
            return Err(error);
        }

        let count = match self.accessor.save_changes().await {
            Ok(count) => count,
            Err(error) => {
                if !audits.is_empty() {
                    self.discard_staged_audits().await;
                }
                return Err(error);
            }
        };

        if !audits.is_empty() {
            self.notify_audits(&audits).await;
        }
        drop(commit_guard);

        if self.options.migration_enabled {
            if cancellation.is_cancelled() {
                warn!(
                    accessor = %self.accessor.accessor_name(),
                    count,
                    "cancellation requested after commit, skipping migration check"
                );
                return Ok(count);
            }

            self.enter(PipelineStage::MigrationChecking, stage_cancellation)?;
            if let Some(migration) = self
                .tracker
                .track(
                    self.snapshot_builder.as_ref(),
                    self.migration_store.as_ref(),
                    stage_cancellation,
                )
                .await?
            {
                self.notify_migration(&migration).await;
            }
        }

        Ok(count)
    }

    async fn capture_audits(&self, cancellation: &Cancellation) -> AppResult<Vec<AuditRecord>> {
        let entries = self.accessor.tracked_changes().await?;
        let audits = self
            .recorder
            .build_audits(
                &entries,
                |entity_type_name| self.policies.is_not_audited(entity_type_name),
                cancellation,
            )
            .await?;

        if !audits.is_empty() {
            self.accessor.stage_audits(audits.clone()).await?;
        }

        Ok(audits)
    }

    async fn discard_staged_audits(&self) {
        if let Err(error) = self.accessor.discard_staged_audits().await {
            warn!(
                accessor = %self.accessor.accessor_name(),
                error = %error,
                "failed to discard staged audits"
            );
        }
    }

    fn enter(&self, stage: PipelineStage, cancellation: &Cancellation) -> AppResult<()> {
        cancellation.check()?;
        debug!(
            accessor = %self.accessor.accessor_name(),
            stage = stage.as_str(),
            "entering pipeline stage"
        );
        Ok(())
    }

    async fn notify_audits(&self, audits: &[AuditRecord]) {
        for observer in &self.observers {
            if let Err(error) = observer
                .audits_added(self.accessor.accessor_name(), audits)
                .await
            {
                warn!(error = %error, "commit observer failed to handle audits");
            }
        }
    }

    async fn notify_migration(&self, migration: &MigrationRecord) {
        for observer in &self.observers {
            if let Err(error) = observer.migration_added(migration).await {
                warn!(error = %error, "commit observer failed to handle migration");
            }
        }
    }
}
