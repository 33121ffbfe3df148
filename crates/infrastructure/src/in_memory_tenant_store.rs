use async_trait::async_trait;
use interlock_application::TenantStore;
use interlock_core::{AppError, AppResult};
use interlock_domain::StoredTenant;
use tokio::sync::RwLock;

/// In-memory tenant store keyed by name and host.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    tenants: RwLock<Vec<StoredTenant>>,
}

impl InMemoryTenantStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn contains_tenant(&self, name: &str, host: &str) -> AppResult<bool> {
        Ok(self.find_tenant(name, host).await?.is_some())
    }

    async fn find_tenant(&self, name: &str, host: &str) -> AppResult<Option<StoredTenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .iter()
            .find(|stored| {
                stored.tenant.name().as_str() == name && stored.tenant.host().as_str() == host
            })
            .cloned())
    }

    async fn create_tenant(&self, tenant: &StoredTenant) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        if tenants.iter().any(|stored| stored.tenant == tenant.tenant) {
            return Err(AppError::Conflict(format!(
                "tenant '{}' on host '{}' already exists",
                tenant.tenant.name().as_str(),
                tenant.tenant.host().as_str()
            )));
        }

        tenants.push(tenant.clone());
        Ok(())
    }
}
