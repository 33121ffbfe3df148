use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use interlock_application::{Accessor, AuditStore, ConnectionState, DataConnection};
use interlock_core::{AppError, AppResult};
use interlock_domain::{AuditRecord, ChangeEntry, EntityState, PropertyValue, TrackedEntity};
use tokio::sync::Mutex;
use tracing::debug;


type EntityKey = (String, String);

#[derive(Debug)]
struct PendingChange {
    state: EntityState,
    entity: Arc<dyn TrackedEntity>,
}

#[derive(Debug, Default)]
struct UnitOfWork {
    committed: HashMap<EntityKey, Vec<PropertyValue>>,
    pending: Vec<PendingChange>,
    staged_audits: Vec<AuditRecord>,
}

/// In-memory unit of work implementing the accessor port.
///
/// Entities are stored as property snapshots keyed by type name and primary
/// key. Staged audits are written to the audit store by the same
/// `save_changes` call that applies the entity changes, and nothing is
/// applied when validation or the audit write fails.
pub struct InMemoryAccessor {
    name: String,
    connection: Arc<dyn DataConnection>,
    audit_store: Arc<dyn AuditStore>,
    unit_of_work: Mutex<UnitOfWork>,
}

impl InMemoryAccessor {
    /// Creates an accessor with an empty store.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        connection: Arc<dyn DataConnection>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            name: name.into(),
            connection,
            audit_store,
            unit_of_work: Mutex::new(UnitOfWork::default()),
        }
    }

    /// Tracks a new entity for insertion.
    pub async fn add(&self, entity: Arc<dyn TrackedEntity>) {
        self.track(EntityState::Added, entity).await;
    }

    /// Tracks an existing entity for update.
    pub async fn update(&self, entity: Arc<dyn TrackedEntity>) {
        self.track(EntityState::Modified, entity).await;
    }

    /// Tracks an existing entity for removal.
    pub async fn remove(&self, entity: Arc<dyn TrackedEntity>) {
        self.track(EntityState::Deleted, entity).await;
    }

    /// Returns the committed property values of one entity.
    pub async fn find(&self, entity_type_name: &str, key: &str) -> Option<Vec<PropertyValue>> {
        self.unit_of_work
            .lock()
            .await
            .committed
            .get(&(entity_type_name.to_owned(), key.to_owned()))
            .cloned()
    }

    /// Returns the number of committed entities.
    pub async fn committed_count(&self) -> usize {
        self.unit_of_work.lock().await.committed.len()
    }

    async fn track(&self, state: EntityState, entity: Arc<dyn TrackedEntity>) {
        debug!(
            accessor = %self.name,
            entity = %entity.entity_type_name(),
            state = state.name(),
            "tracking entity change"
        );
        self.unit_of_work
            .lock()
            .await
            .pending
            .push(PendingChange { state, entity });
    }
}

fn entity_key(entity: &dyn TrackedEntity, values: &[PropertyValue]) -> AppResult<EntityKey> {
    let parts: Vec<&str> = values
        .iter()
        .filter(|value| value.is_primary_key)
        .filter_map(|value| value.value.as_deref())
        .collect();

    if parts.is_empty() {
        return Err(AppError::Validation(format!(
            "entity '{}' has no primary key value",
            entity.entity_type_name()
        )));
    }

    Ok((entity.entity_type_name().to_owned(), parts.join(",")))
}

#[async_trait]
impl Accessor for InMemoryAccessor {
    fn accessor_name(&self) -> &str {
        self.name.as_str()
    }

    fn connection(&self) -> Arc<dyn DataConnection> {
        self.connection.clone()
    }

    async fn tracked_changes(&self) -> AppResult<Vec<ChangeEntry>> {
        let unit_of_work = self.unit_of_work.lock().await;

        unit_of_work
            .pending
            .iter()
            .map(|change| {
                let values = change.entity.property_values();
                let key = entity_key(change.entity.as_ref(), &values)?;
                let original = unit_of_work.committed.get(&key).map(Vec::as_slice);
                Ok(ChangeEntry::track(change.state, change.entity.clone(), original))
            })
            .collect()
    }

    async fn stage_audits(&self, audits: Vec<AuditRecord>) -> AppResult<()> {
        self.unit_of_work.lock().await.staged_audits.extend(audits);
        Ok(())
    }

    async fn discard_staged_audits(&self) -> AppResult<()> {
        self.unit_of_work.lock().await.staged_audits.clear();
        Ok(())
    }

    async fn save_changes(&self) -> AppResult<u64> {
        if self.connection.state().await != ConnectionState::Open {
            return Err(AppError::Connection(format!(
                "accessor '{}' connection is not open",
                self.name
            )));
        }

        let mut unit_of_work = self.unit_of_work.lock().await;

        let mut writes = Vec::with_capacity(unit_of_work.pending.len());
        for change in &unit_of_work.pending {
            let values = change.entity.property_values();
            let key = entity_key(change.entity.as_ref(), &values)?;
            let exists = unit_of_work.committed.contains_key(&key);
            match (change.state, exists) {
                (EntityState::Added, true) => {
                    return Err(AppError::Conflict(format!(
                        "entity '{}' with key '{}' already exists",
                        key.0, key.1
                    )));
                }
                (EntityState::Modified | EntityState::Deleted, false) => {
                    return Err(AppError::NotFound(format!(
                        "entity '{}' with key '{}' does not exist",
                        key.0, key.1
                    )));
                }
                _ => writes.push((change.state, key, values)),
            }
        }

        if !unit_of_work.staged_audits.is_empty() {
            self.audit_store
                .append_audits(&unit_of_work.staged_audits)
                .await?;
        }

        let mut affected = 0_u64;
        for (state, key, values) in writes {
            match state {
                EntityState::Added | EntityState::Modified => {
                    unit_of_work.committed.insert(key, values);
                    affected += 1;
                }
                EntityState::Deleted => {
                    unit_of_work.committed.remove(&key);
                    affected += 1;
                }
                EntityState::Unchanged => {}
            }
        }

        unit_of_work.pending.clear();
        unit_of_work.staged_audits.clear();
        debug!(accessor = %self.name, affected, "saved changes");

        Ok(affected)
    }
}
