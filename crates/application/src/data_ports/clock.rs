use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use interlock_core::{AppResult, Cancellation};

/// Source of the current time for every timestamped operation.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    async fn utc_now(&self, cancellation: &Cancellation) -> AppResult<DateTime<Utc>>;

    /// Returns the current local time.
    async fn local_now(&self, cancellation: &Cancellation) -> AppResult<DateTime<Local>> {
        Ok(self.utc_now(cancellation).await?.with_timezone(&Local))
    }
}
