//! Model snapshot builder over an explicit model description.

use async_trait::async_trait;
use interlock_core::AppResult;
use interlock_domain::DataModel;

use crate::data_ports::ModelSnapshotBuilder;

/// Returns the snapshot name recorded for an accessor.
#[must_use]
pub fn snapshot_name_for(accessor_name: &str) -> String {
    format!("{accessor_name}ModelSnapshot")
}

/// Serializes a registered [`DataModel`] into canonical text.
#[derive(Debug, Clone)]
pub struct CanonicalModelSnapshotBuilder {
    accessor_name: String,
    model: DataModel,
}

impl CanonicalModelSnapshotBuilder {
    /// Creates a builder for one accessor's model.
    #[must_use]
    pub fn new(accessor_name: impl Into<String>, model: DataModel) -> Self {
        Self {
            accessor_name: accessor_name.into(),
            model,
        }
    }
}

#[async_trait]
impl ModelSnapshotBuilder for CanonicalModelSnapshotBuilder {
    fn snapshot_name(&self) -> String {
        snapshot_name_for(self.accessor_name.as_str())
    }

    async fn build_model_body(&self) -> AppResult<String> {
        self.model.canonical_body()
    }
}
