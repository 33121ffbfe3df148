//! Fakes shared by the service tests.

use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use interlock_core::{AppError, AppResult, Cancellation};

use crate::data_ports::Clock;

/// Clock returning a fixed instant that tests may advance.
pub(crate) struct FixedClock {
    now: StdMutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    pub(crate) fn epoch_plus_seconds(seconds: i64) -> Self {
        Self::at(
            Utc.timestamp_opt(1_700_000_000 + seconds, 0)
                .single()
                .unwrap_or_default(),
        )
    }

    pub(crate) fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

#[async_trait]
impl Clock for FixedClock {
    async fn utc_now(&self, cancellation: &Cancellation) -> AppResult<DateTime<Utc>> {
        cancellation.check()?;
        self.now
            .lock()
            .map(|now| *now)
            .map_err(|_| AppError::Internal("clock poisoned".to_owned()))
    }
}

/// Clock that always fails.
pub(crate) struct BrokenClock;

#[async_trait]
impl Clock for BrokenClock {
    async fn utc_now(&self, _cancellation: &Cancellation) -> AppResult<DateTime<Utc>> {
        Err(AppError::Internal("clock unavailable".to_owned()))
    }
}
