//! Startup seeding of the configured default tenant.

use std::sync::Arc;

use interlock_core::{AppResult, Cancellation};
use interlock_domain::{StoredTenant, Tenant};
use tracing::{debug, trace};

use crate::data_options::DataOptions;
use crate::data_ports::TenantStore;
use crate::identifier_service::StoreIdentifier;

/// Seeds store rows every deployment needs.
pub struct StoreInitializer {
    tenant_store: Arc<dyn TenantStore>,
    store_identifier: StoreIdentifier,
    default_tenant: Option<Tenant>,
}

impl StoreInitializer {
    /// Creates an initializer for the configured default tenant.
    #[must_use]
    pub fn new(
        tenant_store: Arc<dyn TenantStore>,
        store_identifier: StoreIdentifier,
        options: &DataOptions,
    ) -> Self {
        Self {
            tenant_store,
            store_identifier,
            default_tenant: options.default_tenant.clone(),
        }
    }

    /// Creates the default tenant row when no row with the same name and
    /// host exists. Returns the created row.
    pub async fn initialize(&self, cancellation: &Cancellation) -> AppResult<Option<StoredTenant>> {
        cancellation.check()?;

        let Some(tenant) = self.default_tenant.as_ref() else {
            debug!("no default tenant configured");
            return Ok(None);
        };

        let name = tenant.name().as_str();
        let host = tenant.host().as_str();
        if self.tenant_store.contains_tenant(name, host).await? {
            debug!(tenant = %name, host = %host, "default tenant already exists");
            return Ok(None);
        }

        let stored = StoredTenant {
            id: self.store_identifier.tenant_id(cancellation).await?,
            tenant: tenant.clone(),
            created_time: self.store_identifier.clock().utc_now(cancellation).await?,
        };
        self.tenant_store.create_tenant(&stored).await?;
        trace!(tenant = %name, host = %host, id = %stored.id, "added default tenant to store");

        Ok(Some(stored))
    }
}
