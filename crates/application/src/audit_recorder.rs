//! Conversion of tracked change entries into append-only audit records.


use chrono::{DateTime, Utc};
use interlock_core::{AppResult, Cancellation};
use interlock_domain::{
    AuditPropertyRecord, AuditRecord, ChangeEntry, EntityState, PropertyEntry,
};
use tracing::debug;

use crate::data_options::DataOptions;
use crate::identifier_service::StoreIdentifier;

/// Builds audit records for the changed entities of one commit.
#[derive(Clone)]
pub struct AuditRecorder {
    store_identifier: StoreIdentifier,
    audited_states: Vec<EntityState>,
    system_actor: String,
}

impl AuditRecorder {
    /// Creates a recorder using the configured audited states and actor.
    #[must_use]
    pub fn new(store_identifier: StoreIdentifier, options: &DataOptions) -> Self {
        Self {
            store_identifier,
            audited_states: options.audited_states.clone(),
            system_actor: options.system_actor.clone(),
        }
    }

    /// Converts change entries into audit records.
    ///
    /// Entries outside the audited states and entries whose type name is
    /// excluded by `is_excluded` produce no record. Only identifier and clock
    /// failures are returned as errors.
    pub async fn build_audits(
        &self,
        entries: &[ChangeEntry],
        is_excluded: impl Fn(&str) -> bool + Send + Sync,
        cancellation: &Cancellation,
    ) -> AppResult<Vec<AuditRecord>> {
        cancellation.check()?;

        let mut audits = Vec::new();
        let mut fallback_time = None;

        for entry in entries {
            if !self.audited_states.contains(&entry.state) {
                continue;
            }
            if is_excluded(entry.entity_type_name.as_str()) {
                debug!(entity = %entry.entity_type_name, "skipping entity excluded from auditing");
                continue;
            }

            let audit = self
                .build_audit(entry, &mut fallback_time, cancellation)
                .await?;
            audits.push(audit);
        }

        Ok(audits)
    }

    async fn build_audit(
        &self,
        entry: &ChangeEntry,
        fallback_time: &mut Option<DateTime<Utc>>,
        cancellation: &Cancellation,
    ) -> AppResult<AuditRecord> {
        let audit_id = self.store_identifier.audit_id(cancellation).await?;

        let mut properties = Vec::with_capacity(entry.properties.len());
        for property in entry
            .properties
            .iter()
            .filter(|property| !property.is_concurrency_token)
        {
            let (old_value, new_value) = audited_values(entry.state, property);
            properties.push(AuditPropertyRecord {
                id: self.store_identifier.audit_property_id(cancellation).await?,
                audit_id: audit_id.clone(),
                property_name: property.name.clone(),
                property_type_name: property.type_name.clone(),
                old_value,
                new_value,
            });
        }

        let (created_by, created_time) = change_metadata(entry);
        let created_time = match created_time {
            Some(created_time) => created_time,
            None => match fallback_time {
                Some(now) => *now,
                None => {
                    let now = self.store_identifier.clock().utc_now(cancellation).await?;
                    *fallback_time = Some(now);
                    now
                }
            },
        };

        Ok(AuditRecord {
            id: audit_id,
            entity_type_name: entry.entity_type_name.clone(),
            entity_id: entry.primary_key_value(),
            table_name: entry.qualified_table_name(),
            state: entry.state,
            state_name: entry.state.name().to_owned(),
            created_by: created_by.unwrap_or_else(|| self.system_actor.clone()),
            created_time,
            properties,
        })
    }
}

fn audited_values(
    state: EntityState,
    property: &PropertyEntry,
) -> (Option<String>, Option<String>) {
    match state {
        EntityState::Added => (None, property.current_value.clone()),
        EntityState::Deleted => (property.original_value.clone(), None),
        EntityState::Modified if property.original_value != property.current_value => (
            property.original_value.clone(),
            property.current_value.clone(),
        ),
        EntityState::Modified | EntityState::Unchanged => (None, None),
    }
}

/// Reads the responsible subject and time from the entity's metadata.
///
/// Modified entities prefer update metadata; otherwise creation metadata is
/// used. Blank subjects count as missing.
fn change_metadata(entry: &ChangeEntry) -> (Option<String>, Option<DateTime<Utc>>) {
    let Some(entity) = entry.entity.as_deref() else {
        return (None, None);
    };

    let (by, time) = match (entry.state, entity.as_updatable(), entity.as_creatable()) {
        (EntityState::Modified, Some(updatable), _) => {
            (updatable.updated_by(), updatable.updated_time())
        }
        (_, _, Some(creatable)) => (creatable.created_by(), creatable.created_time()),
        _ => (None, None),
    };

    (
        by.filter(|by| !by.trim().is_empty()).map(str::to_owned),
        time,
    )
}
