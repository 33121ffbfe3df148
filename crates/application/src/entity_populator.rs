//! Creation and update metadata defaults for entities.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use interlock_core::{AppResult, Cancellation};
use interlock_domain::{Creatable, DataStatus, Ranked, Stateful, Updatable};

use crate::data_options::DataPreferences;
use crate::data_ports::Clock;

/// Applies metadata and configured defaults through capability traits.
#[derive(Clone)]
pub struct EntityPopulator {
    clock: Arc<dyn Clock>,
    preferences: DataPreferences,
}

impl EntityPopulator {
    /// Creates a populator.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, preferences: DataPreferences) -> Self {
        Self { clock, preferences }
    }

    /// Records the creating subject and time.
    ///
    /// The time is the configured creation time override, or the clock.
    pub async fn populate_creation<E>(
        &self,
        entity: &mut E,
        created_by: &str,
        cancellation: &Cancellation,
    ) -> AppResult<DateTime<Utc>>
    where
        E: Creatable + Send + ?Sized,
    {
        let created_time = match self.preferences.default_created_time {
            Some(created_time) => created_time,
            None => self.clock.utc_now(cancellation).await?,
        };

        entity.set_created_by(created_by.to_owned());
        entity.set_created_time(created_time);
        Ok(created_time)
    }

    /// Records the updating subject and the clock time.
    pub async fn populate_updation<E>(
        &self,
        entity: &mut E,
        updated_by: &str,
        cancellation: &Cancellation,
    ) -> AppResult<DateTime<Utc>>
    where
        E: Updatable + Send + ?Sized,
    {
        let updated_time = self.clock.utc_now(cancellation).await?;

        entity.set_updated_by(updated_by.to_owned());
        entity.set_updated_time(updated_time);
        Ok(updated_time)
    }

    /// Assigns the default rank.
    pub fn apply_default_rank(&self, entity: &mut dyn Ranked) {
        entity.set_rank(self.preferences.default_rank);
    }

    /// Assigns the default status unless one was already chosen.
    pub fn apply_default_status(&self, entity: &mut dyn Stateful) {
        if entity.status() == DataStatus::Default {
            entity.set_status(self.preferences.default_status);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};
    use interlock_core::Cancellation;
    use interlock_domain::{Creatable, DataStatus, Ranked, Stateful, Updatable};

    use crate::data_options::DataPreferences;
    use crate::test_support::FixedClock;

    use super::EntityPopulator;

    #[derive(Default)]
    struct Post {
        created_by: Option<String>,
        created_time: Option<DateTime<Utc>>,
        updated_by: Option<String>,
        updated_time: Option<DateTime<Utc>>,
        rank: f32,
        status: DataStatus,
    }

    impl Creatable for Post {
        fn created_by(&self) -> Option<&str> {
            self.created_by.as_deref()
        }

        fn created_time(&self) -> Option<DateTime<Utc>> {
            self.created_time
        }

        fn set_created_by(&mut self, created_by: String) {
            self.created_by = Some(created_by);
        }

        fn set_created_time(&mut self, created_time: DateTime<Utc>) {
            self.created_time = Some(created_time);
        }
    }

    impl Updatable for Post {
        fn updated_by(&self) -> Option<&str> {
            self.updated_by.as_deref()
        }

        fn updated_time(&self) -> Option<DateTime<Utc>> {
            self.updated_time
        }

        fn set_updated_by(&mut self, updated_by: String) {
            self.updated_by = Some(updated_by);
        }

        fn set_updated_time(&mut self, updated_time: DateTime<Utc>) {
            self.updated_time = Some(updated_time);
        }
    }

    impl Ranked for Post {
        fn rank(&self) -> f32 {
            self.rank
        }

        fn set_rank(&mut self, rank: f32) {
            self.rank = rank;
        }
    }

    impl Stateful for Post {
        fn status(&self) -> DataStatus {
            self.status
        }

        fn set_status(&mut self, status: DataStatus) {
            self.status = status;
        }
    }

    #[tokio::test]
    async fn creation_uses_clock_and_preferences() {
        let clock = Arc::new(FixedClock::epoch_plus_seconds(0));
        let populator = EntityPopulator::new(clock.clone(), DataPreferences::default());
        let mut post = Post::default();

        let created = populator
            .populate_creation(&mut post, "author", &Cancellation::new())
            .await;
        clock.advance(Duration::minutes(5));
        let updated = populator
            .populate_updation(&mut post, "editor", &Cancellation::new())
            .await;
        populator.apply_default_rank(&mut post);
        populator.apply_default_status(&mut post);

        assert_eq!(post.created_by(), Some("author"));
        assert_eq!(post.created_time(), created.ok());
        assert_eq!(post.updated_by(), Some("editor"));
        assert_eq!(post.updated_time(), updated.ok());
        assert!(post.created_time() < post.updated_time());
        assert!((post.rank() - 1.0).abs() < f32::EPSILON);
        assert_eq!(post.status(), DataStatus::Active);
    }

    #[tokio::test]
    async fn creation_time_override_wins_and_status_is_kept() {
        let fixed = DateTime::<Utc>::UNIX_EPOCH + Duration::days(1);
        let populator = EntityPopulator::new(
            Arc::new(FixedClock::epoch_plus_seconds(0)),
            DataPreferences {
                default_created_time: Some(fixed),
                ..DataPreferences::default()
            },
        );
        let mut post = Post {
            status: DataStatus::Locking,
            ..Post::default()
        };

        let created = populator
            .populate_creation(&mut post, "importer", &Cancellation::new())
            .await;
        populator.apply_default_status(&mut post);

        assert_eq!(created.ok(), Some(fixed));
        assert_eq!(post.status(), DataStatus::Locking);
    }
}
