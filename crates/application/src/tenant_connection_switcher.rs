//! Write/read separated connection switching around commits.


use std::sync::Arc;

use interlock_core::{AppResult, Cancellation};
use interlock_domain::Tenant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::data_options::DataOptions;
use crate::data_ports::{ConnectionState, DataConnection, TenantResolver};

/// Result of one switch or restore request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// No tenant is resolved for the current scope.
    NoTenant,
    /// The tenant reads and writes through one connection.
    SeparationDisabled,
    /// The connection already targets the requested string.
    AlreadyTargeted,
    /// The connection was re-targeted.
    Switched,
    /// Another holder keeps the write target active; only the holder count
    /// changed.
    Shared,
    /// Re-targeting failed; the error was logged and the previous target
    /// restored.
    Failed,
}

impl SwitchOutcome {
    /// Returns true when the caller holds the write target and must restore.
    #[must_use]
    pub fn holds_write_target(&self) -> bool {
        matches!(self, Self::Switched | Self::Shared)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchState {
    Idle,
    SwitchedToWrite { holders: usize },
}

/// Re-targets one accessor connection to the tenant's write string for the
/// duration of a commit.
///
/// Switches on the same instance are serialized. While switched, further
/// switch requests share the write target and the default string is only
/// restored when the last holder releases it.
pub struct TenantConnectionSwitcher {
    resolver: Arc<dyn TenantResolver>,
    connection: Arc<dyn DataConnection>,
    ensure_database: bool,
    state: Mutex<SwitchState>,
}

impl TenantConnectionSwitcher {
    /// Creates a switcher for one connection.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn TenantResolver>,
        connection: Arc<dyn DataConnection>,
        options: &DataOptions,
    ) -> Self {
        Self {
            resolver,
            connection,
            ensure_database: options.ensure_database,
            state: Mutex::new(SwitchState::Idle),
        }
    }

    /// Points the connection at the tenant's write connection string.
    ///
    /// Connection failures are logged and reported as
    /// [`SwitchOutcome::Failed`]; only cancellation is returned as an error.
    pub async fn switch_for_write(&self, cancellation: &Cancellation) -> AppResult<SwitchOutcome> {
        cancellation.check()?;
        let mut state = self.state.lock().await;

        if let SwitchState::SwitchedToWrite { holders } = &mut *state {
            *holders += 1;
            debug!(holders = *holders, "sharing tenant write connection");
            return Ok(SwitchOutcome::Shared);
        }

        let outcome = self
            .change_connection(Tenant::write_connection_string, "write")
            .await;
        if outcome == SwitchOutcome::Switched {
            *state = SwitchState::SwitchedToWrite { holders: 1 };
        }

        Ok(outcome)
    }

    /// Points the connection back at the tenant's default connection string.
    ///
    /// While other holders share the write target only the holder count is
    /// decremented.
    pub async fn restore_default(&self, cancellation: &Cancellation) -> AppResult<SwitchOutcome> {
        cancellation.check()?;
        let mut state = self.state.lock().await;

        if let SwitchState::SwitchedToWrite { holders } = &mut *state
            && *holders > 1
        {
            *holders -= 1;
            debug!(holders = *holders, "tenant write connection still shared");
            return Ok(SwitchOutcome::Shared);
        }

        *state = SwitchState::Idle;
        Ok(self
            .change_connection(Tenant::default_connection_string, "default")
            .await)
    }

    async fn change_connection(
        &self,
        target_of: fn(&Tenant) -> &str,
        target_name: &'static str,
    ) -> SwitchOutcome {
        let tenant = match self.resolver.current_tenant().await {
            Ok(Some(tenant)) => tenant,
            Ok(None) => return SwitchOutcome::NoTenant,
            Err(error) => {
                warn!(error = %error, "failed to resolve current tenant");
                return SwitchOutcome::Failed;
            }
        };

        if !tenant.write_connection_separation() {
            debug!(
                tenant = %tenant.name().as_str(),
                host = %tenant.host().as_str(),
                "tenant write separation is disabled"
            );
            return SwitchOutcome::SeparationDisabled;
        }

        let target = target_of(&tenant);
        if self.connection.connection_string().await == target {
            debug!(
                tenant = %tenant.name().as_str(),
                target = target_name,
                "connection already targets tenant connection string"
            );
            return SwitchOutcome::AlreadyTargeted;
        }

        match self.retarget(target).await {
            Ok(()) => {
                info!(
                    tenant = %tenant.name().as_str(),
                    host = %tenant.host().as_str(),
                    target = target_name,
                    "changed tenant connection"
                );
                SwitchOutcome::Switched
            }
            Err(error) => {
                warn!(
                    tenant = %tenant.name().as_str(),
                    host = %tenant.host().as_str(),
                    target = target_name,
                    error = %error,
                    "failed to change tenant connection"
                );
                SwitchOutcome::Failed
            }
        }
    }

    /// Points the connection at `connection_string`.
    ///
    /// On failure the previous target is restored and reopened if it was
    /// open, so a failed switch never leaves the connection closed on the
    /// unreachable target.
    async fn retarget(&self, connection_string: &str) -> AppResult<()> {
        let previous = self.connection.connection_string().await;
        let was_open = self.connection.state().await == ConnectionState::Open;

        let result = self.apply_target(connection_string).await;
        if result.is_err()
            && let Err(error) = self.roll_back(previous.as_str(), was_open).await
        {
            warn!(error = %error, "failed to restore previous connection target");
        }

        result
    }

    async fn apply_target(&self, connection_string: &str) -> AppResult<()> {
        if self.connection.state().await == ConnectionState::Open {
            self.connection.close().await?;
        }

        self.connection
            .change_connection_string(connection_string)
            .await?;

        if self.ensure_database {
            self.connection.ensure_created().await?;
        }

        self.connection.open().await
    }

    async fn roll_back(&self, previous: &str, was_open: bool) -> AppResult<()> {
        if self.connection.state().await == ConnectionState::Open {
            self.connection.close().await?;
        }

        if self.connection.connection_string().await != previous {
            self.connection.change_connection_string(previous).await?;
        }

        if was_open {
            self.connection.open().await?;
        }

        Ok(())
    }
}
