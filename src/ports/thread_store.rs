//! Thread Memory Store Port - per-conversation persistence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::collection::DataCollection;
use crate::domain::foundation::{ResourceId, RunId, ThreadId, Timestamp};
use crate::domain::insurance::AuthToken;
use crate::domain::workflow::{StepId, WorkflowId};

/// Serialized pointer to the run a thread is currently suspended in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkflow {
    pub id: WorkflowId,
    pub run_id: RunId,
    /// Node path of the suspended step inside the definition.
    pub cursor: Vec<usize>,
    /// The suspended step itself, for logs and debugging.
    pub current_step: StepId,
}

/// The metadata blob stored per thread.
///
/// `data_collection` written here must already be the output of the merge
/// function; the store is a persistence boundary, not a merge point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadMetadata {
    pub data_collection: Option<DataCollection>,
    pub active_workflow: Option<ActiveWorkflow>,
    pub authentication: Option<AuthToken>,
    pub working_memory: Option<String>,
}

/// One row per (thread, resource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub thread_id: ThreadId,
    pub resource_id: ResourceId,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub metadata: ThreadMetadata,
}

/// Failures of the thread store.
#[derive(Debug, thiserror::Error)]
pub enum ThreadStoreError {
    #[error("failed to serialize thread metadata: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Port for per-thread persistence.
///
/// The store must accept an arbitrary JSON-serializable metadata blob and
/// return it unchanged; it has no opinion about the blob's content.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Loads a thread record, or `None` when the thread is unknown.
    async fn get_thread(&self, thread_id: &ThreadId) -> Result<Option<ThreadRecord>, ThreadStoreError>;

    /// Creates a thread record.
    async fn create_thread(&self, record: ThreadRecord) -> Result<(), ThreadStoreError>;

    /// Writes a thread record back, replacing the stored one.
    async fn save_thread(&self, record: ThreadRecord) -> Result<(), ThreadStoreError>;
}
