//! Tenant resolver backed by configuration.

use async_trait::async_trait;
use interlock_core::AppResult;
use interlock_domain::Tenant;
use tracing::trace;

use crate::data_ports::TenantResolver;

/// Resolves every scope to the configured default tenant.
#[derive(Debug, Clone, Default)]
pub struct DefaultTenantResolver {
    tenant: Option<Tenant>,
}

impl DefaultTenantResolver {
    /// Creates a resolver returning `tenant`.
    #[must_use]
    pub fn new(tenant: Option<Tenant>) -> Self {
        Self { tenant }
    }
}

#[async_trait]
impl TenantResolver for DefaultTenantResolver {
    async fn current_tenant(&self) -> AppResult<Option<Tenant>> {
        if let Some(tenant) = &self.tenant {
            trace!(
                tenant = %tenant.name().as_str(),
                host = %tenant.host().as_str(),
                "resolved default tenant"
            );
        }

        Ok(self.tenant.clone())
    }
}
