use async_trait::async_trait;
use interlock_core::AppResult;

/// Port producing the canonical text form of the current persistence model.
///
/// The same model must always produce byte-identical text.
#[async_trait]
pub trait ModelSnapshotBuilder: Send + Sync {
    /// Returns the snapshot name recorded on migration records.
    fn snapshot_name(&self) -> String;

    /// Serializes the current model.
    async fn build_model_body(&self) -> AppResult<String>;
}
