//! Identifier generation strategies and the purpose-tagged store façade.

mod generators;
mod store_identifier;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use interlock_core::{AppResult, Cancellation};
use interlock_domain::{Identifier, IdentifierKind};

use crate::data_options::IdentifierStrategy;
use crate::data_ports::Clock;

pub use generators::{CombGuidGenerator, IncrementalLongGenerator, StringTokenGenerator};
pub use store_identifier::{IdentifierPurpose, StoreIdentifier};

/// Common contract of identifier generation strategies.
#[async_trait]
pub trait IdentifierGenerator: Send + Sync {
    /// Returns the identifier family this generator produces.
    fn kind(&self) -> IdentifierKind;

    /// Produces a new identifier.
    ///
    /// Strategies that embed a timestamp read it from `clock`. Cancellation
    /// is checked before any work starts so no partial value is produced.
    async fn generate(
        &self,
        clock: &dyn Clock,
        cancellation: &Cancellation,
    ) -> AppResult<Identifier>;
}

/// Builds the generator selected by configuration.
#[must_use]
pub fn build_identifier_generator(strategy: IdentifierStrategy) -> Arc<dyn IdentifierGenerator> {
    match strategy {
        IdentifierStrategy::CombGuid => Arc::new(CombGuidGenerator::new()),
        IdentifierStrategy::IncrementalLong => Arc::new(IncrementalLongGenerator::new()),
        IdentifierStrategy::StringToken => Arc::new(StringTokenGenerator::new()),
    }
}
