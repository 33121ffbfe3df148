use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interlock_application::Clock;
use interlock_core::{AppResult, Cancellation};

/// Clock reading the operating system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a system clock.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for SystemClock {
    async fn utc_now(&self, cancellation: &Cancellation) -> AppResult<DateTime<Utc>> {
        cancellation.check()?;
        Ok(Utc::now())
    }
}
