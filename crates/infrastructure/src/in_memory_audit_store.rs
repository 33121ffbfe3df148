use async_trait::async_trait;
use interlock_application::AuditStore;
use interlock_core::AppResult;
use interlock_domain::AuditRecord;
use tokio::sync::RwLock;

/// In-memory append-only audit store.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    audits: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored audit in append order.
    pub async fn all(&self) -> Vec<AuditRecord> {
        self.audits.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append_audits(&self, audits: &[AuditRecord]) -> AppResult<()> {
        self.audits.write().await.extend_from_slice(audits);
        Ok(())
    }

    async fn list_audits_for_entity(
        &self,
        entity_type_name: &str,
        entity_id: &str,
    ) -> AppResult<Vec<AuditRecord>> {
        Ok(self
            .audits
            .read()
            .await
            .iter()
            .filter(|audit| {
                audit.entity_type_name == entity_type_name
                    && audit.entity_id.as_deref() == Some(entity_id)
            })
            .cloned()
            .collect())
    }
}
