//! Run Store Port - snapshots of suspended workflow runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::RunId;
use crate::domain::workflow::{StepData, WorkflowRunState};

/// A suspended run, frozen at its suspension point.
///
/// `state` records identity, cursor, and status; `snapshot` is the
/// envelope that was entering the suspended step. On resume the snapshot
/// is fed back into the definition at the state's cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRun {
    pub state: WorkflowRunState,
    pub snapshot: StepData,
}

/// Failures of the run store.
#[derive(Debug, thiserror::Error)]
pub enum RunStoreError {
    #[error("failed to serialize run snapshot: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Port for persisting suspended runs between process invocations.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Loads a stored run, or `None` when unknown.
    async fn load(&self, run_id: &RunId) -> Result<Option<StoredRun>, RunStoreError>;

    /// Stores or replaces a run snapshot.
    async fn save(&self, run: StoredRun) -> Result<(), RunStoreError>;

    /// Removes a run. Removing an unknown run is a no-op.
    async fn delete(&self, run_id: &RunId) -> Result<(), RunStoreError>;
}
