//! The thread-memory protocol.
//!
//! A thin wrapper over the thread store that implements lazy creation
//! and shallow partial updates. This layer is a persistence boundary
//! only: any `data_collection` written through it must already be merged
//! upstream.

use std::sync::Arc;

use crate::domain::collection::DataCollection;
use crate::domain::foundation::{ResourceId, ThreadId, Timestamp};
use crate::domain::insurance::AuthToken;
use crate::ports::{ActiveWorkflow, ThreadMetadata, ThreadRecord, ThreadStore, ThreadStoreError};

/// Partial update of a thread's metadata.
///
/// Every field is tri-state: untouched, set to a value, or cleared.
/// Fields not mentioned keep their stored value, matching a shallow
/// merge of the partial over the record.
#[derive(Debug, Clone, Default)]
pub struct ThreadUpdate {
    data_collection: Option<Option<DataCollection>>,
    active_workflow: Option<Option<ActiveWorkflow>>,
    authentication: Option<Option<AuthToken>>,
    working_memory: Option<Option<String>>,
}

impl ThreadUpdate {
    /// An update that touches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the collected data.
    pub fn data_collection(mut self, value: Option<DataCollection>) -> Self {
        self.data_collection = Some(value);
        self
    }

    /// Sets or clears the active-workflow pointer.
    pub fn active_workflow(mut self, value: Option<ActiveWorkflow>) -> Self {
        self.active_workflow = Some(value);
        self
    }

    /// Sets or clears the cached authentication.
    pub fn authentication(mut self, value: Option<AuthToken>) -> Self {
        self.authentication = Some(value);
        self
    }

    /// Sets or clears the working-memory note.
    pub fn working_memory(mut self, value: Option<String>) -> Self {
        self.working_memory = Some(value);
        self
    }

    fn apply(self, metadata: &mut ThreadMetadata) {
        if let Some(value) = self.data_collection {
            metadata.data_collection = value;
        }
        if let Some(value) = self.active_workflow {
            metadata.active_workflow = value;
        }
        if let Some(value) = self.authentication {
            metadata.authentication = value;
        }
        if let Some(value) = self.working_memory {
            metadata.working_memory = value;
        }
    }
}

/// Handle to one thread's persisted memory.
pub struct ThreadMemory {
    store: Arc<dyn ThreadStore>,
    thread_id: ThreadId,
    resource_id: ResourceId,
}

impl ThreadMemory {
    /// Creates a handle for the given thread.
    pub fn new(store: Arc<dyn ThreadStore>, thread_id: ThreadId, resource_id: ResourceId) -> Self {
        Self {
            store,
            thread_id,
            resource_id,
        }
    }

    fn title(&self) -> String {
        format!("{}_{}", self.thread_id, Timestamp::now().to_rfc3339())
    }

    /// Loads the thread record, creating an empty one on first access.
    pub async fn get(&self) -> Result<ThreadRecord, ThreadStoreError> {
        if let Some(record) = self.store.get_thread(&self.thread_id).await? {
            return Ok(record);
        }

        let now = Timestamp::now();
        let record = ThreadRecord {
            thread_id: self.thread_id.clone(),
            resource_id: self.resource_id.clone(),
            title: self.title(),
            created_at: now,
            updated_at: now,
            metadata: ThreadMetadata::default(),
        };
        self.store.create_thread(record.clone()).await?;
        Ok(record)
    }

    /// Applies a partial update over the stored record.
    ///
    /// Reads the current record, merges the update over its metadata,
    /// and writes it back with a fresh `updated_at`.
    pub async fn update(&self, update: ThreadUpdate) -> Result<(), ThreadStoreError> {
        let mut record = self.get().await?;
        update.apply(&mut record.metadata);
        record.updated_at = Timestamp::now();
        self.store.save_thread(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryThreadStore;

    fn memory(store: &InMemoryThreadStore) -> ThreadMemory {
        ThreadMemory::new(
            Arc::new(store.clone()),
            ThreadId::new("t1"),
            ResourceId::new("r1"),
        )
    }

    #[tokio::test]
    async fn first_access_creates_an_empty_record() {
        let store = InMemoryThreadStore::new();
        let record = memory(&store).get().await.unwrap();

        assert_eq!(record.thread_id, ThreadId::new("t1"));
        assert!(record.title.starts_with("t1_"));
        assert_eq!(record.metadata, ThreadMetadata::default());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_is_idempotent() {
        let store = InMemoryThreadStore::new();
        let mem = memory(&store);

        let first = mem.get().await.unwrap();
        let second = mem.get().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_touches_only_named_fields() {
        let store = InMemoryThreadStore::new();
        let mem = memory(&store);

        let mut collection = DataCollection::new();
        collection.first_name = Some("Mara".into());
        mem.update(ThreadUpdate::new().data_collection(Some(collection.clone())))
            .await
            .unwrap();

        mem.update(ThreadUpdate::new().working_memory(Some("note".into())))
            .await
            .unwrap();

        let record = mem.get().await.unwrap();
        // The collection survived the second, unrelated update.
        assert_eq!(record.metadata.data_collection, Some(collection));
        assert_eq!(record.metadata.working_memory.as_deref(), Some("note"));
    }

    #[tokio::test]
    async fn update_can_clear_a_field() {
        let store = InMemoryThreadStore::new();
        let mem = memory(&store);

        mem.update(ThreadUpdate::new().working_memory(Some("note".into())))
            .await
            .unwrap();
        mem.update(ThreadUpdate::new().working_memory(None))
            .await
            .unwrap();

        let record = mem.get().await.unwrap();
        assert!(record.metadata.working_memory.is_none());
    }

    #[tokio::test]
    async fn update_refreshes_the_timestamp() {
        let store = InMemoryThreadStore::new();
        let mem = memory(&store);

        let created = mem.get().await.unwrap();
        mem.update(ThreadUpdate::new().working_memory(Some("x".into())))
            .await
            .unwrap();
        let updated = mem.get().await.unwrap();

        assert!(!updated.updated_at.is_before(&created.updated_at));
        assert_eq!(updated.created_at, created.created_at);
    }
}
