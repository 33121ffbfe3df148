use async_trait::async_trait;
use interlock_core::AppResult;
use interlock_domain::Tenant;

/// Port resolving the tenant of the current operation.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// Returns the current tenant, if any.
    async fn current_tenant(&self) -> AppResult<Option<Tenant>>;
}
