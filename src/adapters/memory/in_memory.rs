//! In-memory thread and run stores.
//!
//! Used by tests and the demo binary. Both stores are plain mutex-guarded
//! maps; per-thread serialization of inbound messages is the caller's
//! responsibility, matching the single-writer-per-thread model.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{RunId, ThreadId};
use crate::ports::{
    RunStore, RunStoreError, StoredRun, ThreadRecord, ThreadStore, ThreadStoreError,
};

/// Thread store backed by a process-local map.
#[derive(Clone, Default)]
pub struct InMemoryThreadStore {
    threads: Arc<Mutex<HashMap<ThreadId, ThreadRecord>>>,
}

impl InMemoryThreadStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored threads, for test assertions.
    pub fn len(&self) -> usize {
        self.threads.lock().unwrap().len()
    }

    /// True when no thread has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn get_thread(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ThreadRecord>, ThreadStoreError> {
        Ok(self.threads.lock().unwrap().get(thread_id).cloned())
    }

    async fn create_thread(&self, record: ThreadRecord) -> Result<(), ThreadStoreError> {
        self.threads
            .lock()
            .unwrap()
            .insert(record.thread_id.clone(), record);
        Ok(())
    }

    async fn save_thread(&self, record: ThreadRecord) -> Result<(), ThreadStoreError> {
        self.threads
            .lock()
            .unwrap()
            .insert(record.thread_id.clone(), record);
        Ok(())
    }
}

/// Run store backed by a process-local map.
#[derive(Clone, Default)]
pub struct InMemoryRunStore {
    runs: Arc<Mutex<HashMap<RunId, StoredRun>>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a run is currently stored, for test assertions.
    pub fn contains(&self, run_id: &RunId) -> bool {
        self.runs.lock().unwrap().contains_key(run_id)
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn load(&self, run_id: &RunId) -> Result<Option<StoredRun>, RunStoreError> {
        Ok(self.runs.lock().unwrap().get(run_id).cloned())
    }

    async fn save(&self, run: StoredRun) -> Result<(), RunStoreError> {
        self.runs.lock().unwrap().insert(run.state.run_id, run);
        Ok(())
    }

    async fn delete(&self, run_id: &RunId) -> Result<(), RunStoreError> {
        self.runs.lock().unwrap().remove(run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ResourceId, Timestamp};
    use crate::domain::workflow::{RunStatus, StepData, WorkflowId, WorkflowRunState};
    use crate::ports::ThreadMetadata;

    fn record(thread: &str) -> ThreadRecord {
        ThreadRecord {
            thread_id: ThreadId::new(thread),
            resource_id: ResourceId::new("r1"),
            title: format!("{thread}_title"),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
            metadata: ThreadMetadata::default(),
        }
    }

    #[tokio::test]
    async fn unknown_thread_is_none() {
        let store = InMemoryThreadStore::new();
        let loaded = store.get_thread(&ThreadId::new("missing")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_replaces_the_stored_record() {
        let store = InMemoryThreadStore::new();
        store.create_thread(record("t1")).await.unwrap();

        let mut updated = record("t1");
        updated.metadata.working_memory = Some("notes".into());
        store.save_thread(updated).await.unwrap();

        let loaded = store.get_thread(&ThreadId::new("t1")).await.unwrap().unwrap();
        assert_eq!(loaded.metadata.working_memory.as_deref(), Some("notes"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn run_store_round_trips_and_deletes() {
        let store = InMemoryRunStore::new();
        let run = StoredRun {
            state: WorkflowRunState {
                workflow_id: WorkflowId::SalesWorkflow,
                run_id: RunId::new(),
                cursor: vec![0, 1],
                status: RunStatus::Suspended,
            },
            snapshot: StepData::default(),
        };
        let id = run.state.run_id;

        store.save(run.clone()).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(run));

        store.delete(&id).await.unwrap();
        assert!(store.load(&id).await.unwrap().is_none());

        // Deleting again is a no-op.
        store.delete(&id).await.unwrap();
    }
}
