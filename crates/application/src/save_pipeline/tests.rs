use std::sync::Arc;

use async_trait::async_trait;
use interlock_core::{AppError, AppResult, Cancellation};
use interlock_domain::{
    AuditRecord, ChangeEntry, EntityPolicies, EntityState, MigrationRecord, PropertyValue, Tenant,
    TrackedEntity,
};
use tokio::sync::Mutex;

use crate::data_options::{DataOptions, IdentifierStrategy};
use crate::data_ports::{
    Accessor, CommitObserver, ConnectionState, DataConnection, MigrationStore,
    ModelSnapshotBuilder, TenantResolver,
};
use crate::test_support::FixedClock;

use super::{PipelineDependencies, SaveInterceptionPipeline};

type EventLog = Arc<Mutex<Vec<String>>>;

async fn record(events: &EventLog, event: impl Into<String>) {
    events.lock().await.push(event.into());
}

#[derive(Debug)]
struct Category {
    id: i32,
    name: String,
}

impl TrackedEntity for Category {
    fn entity_type_name(&self) -> &str {
        "Category"
    }

    fn table_name(&self) -> &str {
        "categories"
    }

    fn property_values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::new("Id", "i32", Some(self.id.to_string())).primary_key(),
            PropertyValue::new("Name", "String", Some(self.name.clone())),
        ]
    }
}

#[derive(Debug)]
struct Article {
    id: String,
    title: String,
    category_id: i32,
}

impl TrackedEntity for Article {
    fn entity_type_name(&self) -> &str {
        "Article"
    }

    fn table_name(&self) -> &str {
        "articles"
    }

    fn property_values(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::new("Id", "String", Some(self.id.clone())).primary_key(),
            PropertyValue::new("Title", "String", Some(self.title.clone())),
            PropertyValue::new("CategoryId", "i32", Some(self.category_id.to_string())),
        ]
    }
}

fn category_and_article() -> Vec<ChangeEntry> {
    vec![
        ChangeEntry::track(
            EntityState::Added,
            Arc::new(Category {
                id: 1,
                name: "Rust".to_owned(),
            }),
            None,
        ),
        ChangeEntry::track(
            EntityState::Added,
            Arc::new(Article {
                id: "a-1".to_owned(),
                title: "Ownership".to_owned(),
                category_id: 1,
            }),
            None,
        ),
    ]
}

struct FakeConnection {
    connection_string: Mutex<String>,
    state: Mutex<ConnectionState>,
    events: EventLog,
}

#[async_trait]
impl DataConnection for FakeConnection {
    async fn connection_string(&self) -> String {
        self.connection_string.lock().await.clone()
    }

    async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    async fn open(&self) -> AppResult<()> {
        *self.state.lock().await = ConnectionState::Open;
        let target = self.connection_string.lock().await.clone();
        record(&self.events, format!("open:{target}")).await;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        *self.state.lock().await = ConnectionState::Closed;
        record(&self.events, "close").await;
        Ok(())
    }

    async fn change_connection_string(&self, connection_string: &str) -> AppResult<()> {
        *self.connection_string.lock().await = connection_string.to_owned();
        record(&self.events, format!("target:{connection_string}")).await;
        Ok(())
    }

    async fn ensure_created(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
enum CancelPoint {
    #[default]
    Never,
    WhileStaging(Cancellation),
    WhileSaving(Cancellation),
}

struct FakeAccessor {
    connection: Arc<FakeConnection>,
    changes: Vec<ChangeEntry>,
    staged: Mutex<Vec<AuditRecord>>,
    committed_audits: Mutex<Vec<AuditRecord>>,
    fail_commit: bool,
    fail_discard: bool,
    cancel_point: CancelPoint,
    events: EventLog,
}

#[async_trait]
impl Accessor for FakeAccessor {
    fn accessor_name(&self) -> &str {
        "BlogAccessor"
    }

    fn connection(&self) -> Arc<dyn DataConnection> {
        self.connection.clone()
    }

    async fn tracked_changes(&self) -> AppResult<Vec<ChangeEntry>> {
        record(&self.events, "tracked_changes").await;
        Ok(self.changes.clone())
    }

    async fn stage_audits(&self, audits: Vec<AuditRecord>) -> AppResult<()> {
        record(&self.events, format!("stage_audits:{}", audits.len())).await;
        self.staged.lock().await.extend(audits);
        if let CancelPoint::WhileStaging(cancellation) = &self.cancel_point {
            cancellation.cancel();
        }
        Ok(())
    }

    async fn discard_staged_audits(&self) -> AppResult<()> {
        record(&self.events, "discard_staged_audits").await;
        if self.fail_discard {
            return Err(AppError::Internal("audit staging area unavailable".to_owned()));
        }
        self.staged.lock().await.clear();
        Ok(())
    }

    async fn save_changes(&self) -> AppResult<u64> {
        record(&self.events, "save_changes").await;
        if self.fail_commit {
            return Err(AppError::Conflict("concurrency token mismatch".to_owned()));
        }
        if let CancelPoint::WhileSaving(cancellation) = &self.cancel_point {
            cancellation.cancel();
        }

        let staged: Vec<AuditRecord> = self.staged.lock().await.drain(..).collect();
        self.committed_audits.lock().await.extend(staged);
        Ok(self.changes.len() as u64)
    }
}

struct FixedTenantResolver {
    tenant: Option<Tenant>,
}

#[async_trait]
impl TenantResolver for FixedTenantResolver {
    async fn current_tenant(&self) -> AppResult<Option<Tenant>> {
        Ok(self.tenant.clone())
    }
}

struct FakeSnapshotBuilder {
    events: EventLog,
}

#[async_trait]
impl ModelSnapshotBuilder for FakeSnapshotBuilder {
    fn snapshot_name(&self) -> String {
        "BlogAccessorModelSnapshot".to_owned()
    }

    async fn build_model_body(&self) -> AppResult<String> {
        record(&self.events, "snapshot").await;
        Ok("{\"entities\":[\"Article\",\"Category\"]}".to_owned())
    }
}

struct FakeMigrationStore {
    records: Mutex<Vec<MigrationRecord>>,
    events: EventLog,
}

#[async_trait]
impl MigrationStore for FakeMigrationStore {
    async fn list_migrations(&self, _accessor_name: &str) -> AppResult<Vec<MigrationRecord>> {
        record(&self.events, "list_migrations").await;
        Ok(self.records.lock().await.clone())
    }

    async fn append_migration(&self, migration: &MigrationRecord) -> AppResult<()> {
        record(&self.events, "append_migration").await;
        self.records.lock().await.push(migration.clone());
        Ok(())
    }
}

struct RecordingObserver {
    events: EventLog,
    fail: bool,
}

#[async_trait]
impl CommitObserver for RecordingObserver {
    async fn audits_added(&self, _accessor_name: &str, audits: &[AuditRecord]) -> AppResult<()> {
        record(&self.events, format!("audits_added:{}", audits.len())).await;
        if self.fail {
            return Err(AppError::Internal("observer offline".to_owned()));
        }
        Ok(())
    }

    async fn migration_added(&self, _migration: &MigrationRecord) -> AppResult<()> {
        record(&self.events, "migration_added").await;
        Ok(())
    }
}

struct Fixture {
    events: EventLog,
    accessor: Arc<FakeAccessor>,
    connection: Arc<FakeConnection>,
    migrations: Arc<FakeMigrationStore>,
    pipeline: SaveInterceptionPipeline,
}

struct FixtureSettings {
    options: DataOptions,
    changes: Vec<ChangeEntry>,
    fail_commit: bool,
    fail_discard: bool,
    cancel_point: CancelPoint,
    failing_observer: bool,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            options: DataOptions {
                tenant_enabled: true,
                identifier_strategy: IdentifierStrategy::IncrementalLong,
                ..DataOptions::default()
            },
            changes: category_and_article(),
            fail_commit: false,
            fail_discard: false,
            cancel_point: CancelPoint::Never,
            failing_observer: false,
        }
    }
}

fn fixture(settings: FixtureSettings) -> Fixture {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let connection = Arc::new(FakeConnection {
        connection_string: Mutex::new("db=read".to_owned()),
        state: Mutex::new(ConnectionState::Open),
        events: events.clone(),
    });
    let accessor = Arc::new(FakeAccessor {
        connection: connection.clone(),
        changes: settings.changes,
        staged: Mutex::new(Vec::new()),
        committed_audits: Mutex::new(Vec::new()),
        fail_commit: settings.fail_commit,
        fail_discard: settings.fail_discard,
        cancel_point: settings.cancel_point,
        events: events.clone(),
    });
    let migrations = Arc::new(FakeMigrationStore {
        records: Mutex::new(Vec::new()),
        events: events.clone(),
    });
    let tenant = Tenant::new("acme", "acme.local", "db=read")
        .ok()
        .map(|tenant| tenant.with_write_connection("db=write"));

    let pipeline = SaveInterceptionPipeline::new(
        PipelineDependencies {
            accessor: accessor.clone(),
            clock: Arc::new(FixedClock::epoch_plus_seconds(0)),
            tenant_resolver: Arc::new(FixedTenantResolver { tenant }),
            snapshot_builder: Arc::new(FakeSnapshotBuilder {
                events: events.clone(),
            }),
            migration_store: migrations.clone(),
        },
        settings.options,
        EntityPolicies::new(),
    )
    .with_observer(Arc::new(RecordingObserver {
        events: events.clone(),
        fail: settings.failing_observer,
    }));

    Fixture {
        events,
        accessor,
        connection,
        migrations,
        pipeline,
    }
}

#[tokio::test]
async fn stages_run_in_order() {
    let fixture = fixture(FixtureSettings::default());

    let count = fixture.pipeline.commit(&Cancellation::new()).await;

    assert_eq!(count.ok(), Some(2));
    assert_eq!(
        *fixture.events.lock().await,
        vec![
            "close",
            "target:db=write",
            "open:db=write",
            "tracked_changes",
            "stage_audits:2",
            "save_changes",
            "audits_added:2",
            "list_migrations",
            "snapshot",
            "append_migration",
            "migration_added",
            "close",
            "target:db=read",
            "open:db=read",
        ]
    );
}

#[tokio::test]
async fn category_and_article_produce_two_added_audits() {
    let fixture = fixture(FixtureSettings::default());

    let count = fixture.pipeline.commit(&Cancellation::new()).await;

    assert_eq!(count.ok(), Some(2));
    let audits = fixture.accessor.committed_audits.lock().await;
    assert_eq!(audits.len(), 2);
    assert!(audits.iter().all(|audit| audit.state == EntityState::Added));
    assert!(audits.iter().all(|audit| !audit.has_old_values()));
    assert_eq!(audits[0].entity_type_name, "Category");
    assert_eq!(audits[1].entity_id.as_deref(), Some("a-1"));
    assert_eq!(fixture.migrations.records.lock().await.len(), 1);
    assert_eq!(fixture.connection.connection_string().await, "db=read");
}

#[tokio::test]
async fn commit_errors_propagate_and_still_restore_the_connection() {
    let fixture = fixture(FixtureSettings {
        fail_commit: true,
        ..FixtureSettings::default()
    });

    let result = fixture.pipeline.commit(&Cancellation::new()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(fixture.connection.connection_string().await, "db=read");
    assert!(fixture.migrations.records.lock().await.is_empty());
    assert!(fixture.accessor.staged.lock().await.is_empty());
    let events = fixture.events.lock().await;
    assert!(events.iter().any(|event| event == "discard_staged_audits"));
    assert!(!events.iter().any(|event| event == "list_migrations"));
}

#[tokio::test]
async fn empty_commit_still_checks_migrations() {
    let fixture = fixture(FixtureSettings {
        changes: Vec::new(),
        ..FixtureSettings::default()
    });

    let count = fixture.pipeline.commit(&Cancellation::new()).await;

    assert_eq!(count.ok(), Some(0));
    assert_eq!(fixture.migrations.records.lock().await.len(), 1);
    let events = fixture.events.lock().await;
    assert!(!events.iter().any(|event| event.starts_with("stage_audits")));
    assert!(!events.iter().any(|event| event.starts_with("audits_added")));
}

#[tokio::test]
async fn unchanged_model_is_recorded_once_across_commits() {
    let fixture = fixture(FixtureSettings::default());
    let cancellation = Cancellation::new();

    let first = fixture.pipeline.commit(&cancellation).await;
    let second = fixture.pipeline.commit(&cancellation).await;

    assert!(first.is_ok() && second.is_ok());
    assert_eq!(fixture.migrations.records.lock().await.len(), 1);
}

#[tokio::test]
async fn parallel_commits_record_one_migration() {
    let fixture = fixture(FixtureSettings::default());
    let pipeline = Arc::new(fixture.pipeline);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.commit(&Cancellation::new()).await
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await, Ok(Ok(_))));
    }

    assert_eq!(fixture.migrations.records.lock().await.len(), 1);
    assert_eq!(fixture.connection.connection_string().await, "db=read");
}

#[tokio::test]
async fn cancellation_before_start_touches_nothing() {
    let fixture = fixture(FixtureSettings::default());
    let cancellation = Cancellation::new();
    cancellation.cancel();

    let result = fixture.pipeline.commit(&cancellation).await;

    assert!(matches!(result, Err(error) if error.is_cancelled()));
    assert!(fixture.events.lock().await.is_empty());
}

#[tokio::test]
async fn cancellation_after_auditing_discards_staged_audits() {
    let cancellation = Cancellation::new();
    let fixture = fixture(FixtureSettings {
        cancel_point: CancelPoint::WhileStaging(cancellation.clone()),
        ..FixtureSettings::default()
    });

    let result = fixture.pipeline.commit(&cancellation).await;

    assert!(matches!(result, Err(error) if error.is_cancelled()));
    assert!(fixture.accessor.staged.lock().await.is_empty());
    assert!(fixture.accessor.committed_audits.lock().await.is_empty());
    let events = fixture.events.lock().await;
    assert!(!events.iter().any(|event| event == "save_changes"));
    assert_eq!(events.last().map(String::as_str), Some("open:db=read"));
}

#[tokio::test]
async fn cancellation_survives_a_failed_audit_discard() {
    let cancellation = Cancellation::new();
    let fixture = fixture(FixtureSettings {
        cancel_point: CancelPoint::WhileStaging(cancellation.clone()),
        fail_discard: true,
        ..FixtureSettings::default()
    });

    let result = fixture.pipeline.commit(&cancellation).await;

    assert!(matches!(result, Err(error) if error.is_cancelled()));
    let events = fixture.events.lock().await;
    assert!(events.iter().any(|event| event == "discard_staged_audits"));
    assert!(!events.iter().any(|event| event == "save_changes"));
}

#[tokio::test]
async fn cancellation_after_commit_returns_the_count() {
    let cancellation = Cancellation::new();
    let fixture = fixture(FixtureSettings {
        cancel_point: CancelPoint::WhileSaving(cancellation.clone()),
        ..FixtureSettings::default()
    });

    let result = fixture.pipeline.commit(&cancellation).await;

    assert_eq!(result.ok(), Some(2));
    assert!(fixture.migrations.records.lock().await.is_empty());
    assert_eq!(fixture.connection.connection_string().await, "db=read");
}

#[tokio::test]
async fn disabled_stages_only_commit() {
    let fixture = fixture(FixtureSettings {
        options: DataOptions {
            tenant_enabled: false,
            audit_enabled: false,
            migration_enabled: false,
            ..DataOptions::default()
        },
        ..FixtureSettings::default()
    });

    let count = fixture.pipeline.commit(&Cancellation::new()).await;

    assert_eq!(count.ok(), Some(2));
    assert_eq!(*fixture.events.lock().await, vec!["save_changes"]);
}

#[tokio::test]
async fn observer_failures_do_not_fail_the_commit() {
    let fixture = fixture(FixtureSettings {
        failing_observer: true,
        ..FixtureSettings::default()
    });

    let count = fixture.pipeline.commit(&Cancellation::new()).await;

    assert_eq!(count.ok(), Some(2));
    assert_eq!(fixture.accessor.committed_audits.lock().await.len(), 2);
}

#[test]
fn blocking_commit_matches_async_commit() {
    let fixture = fixture(FixtureSettings::default());

    let count = fixture.pipeline.commit_blocking(&Cancellation::new());

    assert_eq!(count.ok(), Some(2));
    assert_eq!(fixture.accessor.committed_audits.blocking_lock().len(), 2);
}

#[tokio::test]
async fn blocking_commit_refuses_to_run_inside_a_runtime() {
    let fixture = fixture(FixtureSettings::default());

    let result = fixture.pipeline.commit_blocking(&Cancellation::new());

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(fixture.events.lock().await.is_empty());
}
