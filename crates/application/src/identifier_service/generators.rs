use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use interlock_core::{AppError, AppResult, Cancellation};
use interlock_domain::{Identifier, IdentifierKind};
use uuid::Uuid;

use super::IdentifierGenerator;
use crate::data_ports::Clock;

/// Time-ordered GUID generator.
///
/// Layout: 48-bit big-endian Unix milliseconds, then 80 random bits with the
/// version nibble set to 7 and RFC 4122 variant bits. The timestamp never
/// moves backwards within one generator even if the clock does.
#[derive(Debug, Default)]
pub struct CombGuidGenerator {
    last_millis: AtomicI64,
}

impl CombGuidGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_millis: AtomicI64::new(0),
        }
    }

    pub(super) async fn next_guid(
        &self,
        clock: &dyn Clock,
        cancellation: &Cancellation,
    ) -> AppResult<Uuid> {
        cancellation.check()?;
        let now = clock.utc_now(cancellation).await?;
        let millis = self.monotonic_millis(now.timestamp_millis());

        let mut random = [0u8; 10];
        getrandom::fill(&mut random).map_err(|error| {
            AppError::Internal(format!("failed to generate identifier entropy: {error}"))
        })?;

        Ok(comb_guid(millis, random))
    }

    fn monotonic_millis(&self, observed: i64) -> i64 {
        let observed = observed.max(0);
        let previous = self.last_millis.fetch_max(observed, Ordering::AcqRel);
        previous.max(observed)
    }
}

#[async_trait]
impl IdentifierGenerator for CombGuidGenerator {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Guid
    }

    async fn generate(
        &self,
        clock: &dyn Clock,
        cancellation: &Cancellation,
    ) -> AppResult<Identifier> {
        self.next_guid(clock, cancellation)
            .await
            .map(Identifier::from_guid)
    }
}

pub(super) fn comb_guid(millis: i64, random: [u8; 10]) -> Uuid {
    let timestamp = (millis as u64 & 0xFFFF_FFFF_FFFF).to_be_bytes();
    let mut bytes = [0u8; 16];
    bytes[..6].copy_from_slice(&timestamp[2..]);
    bytes[6..].copy_from_slice(&random);
    bytes[6] = (bytes[6] & 0x0F) | 0x70;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;
    Uuid::from_bytes(bytes)
}

/// Process-local incrementing integer generator.
///
/// Not safe across processes without an external sequence. The counter
/// always holds the next value to issue, so the largest identifier issued is
/// `i64::MAX - 1`; the call after that fails with an exhausted sequence.
#[derive(Debug)]
pub struct IncrementalLongGenerator {
    next: AtomicI64,
}

impl IncrementalLongGenerator {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first value is `seed`.
    #[must_use]
    pub fn starting_at(seed: i64) -> Self {
        Self {
            next: AtomicI64::new(seed),
        }
    }
}

impl Default for IncrementalLongGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentifierGenerator for IncrementalLongGenerator {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Long
    }

    async fn generate(
        &self,
        _clock: &dyn Clock,
        cancellation: &Cancellation,
    ) -> AppResult<Identifier> {
        cancellation.check()?;
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(1)
            })
            .map(Identifier::from_long)
            .map_err(|_| AppError::Internal("identifier sequence exhausted".to_owned()))
    }
}

/// Time-ordered GUID generator producing text tokens.
#[derive(Debug, Default)]
pub struct StringTokenGenerator {
    guids: CombGuidGenerator,
}

impl StringTokenGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            guids: CombGuidGenerator::new(),
        }
    }
}

#[async_trait]
impl IdentifierGenerator for StringTokenGenerator {
    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Text
    }

    async fn generate(
        &self,
        clock: &dyn Clock,
        cancellation: &Cancellation,
    ) -> AppResult<Identifier> {
        let guid = self.guids.next_guid(clock, cancellation).await?;
        Ok(Identifier::Text(guid.to_string()))
    }
}
