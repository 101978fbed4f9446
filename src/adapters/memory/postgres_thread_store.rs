//! PostgreSQL implementation of the thread store.
//!
//! One row per thread; the metadata blob is stored as JSON text so the
//! schema stays agnostic of what the core persists.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS threads (
//!     thread_id   TEXT PRIMARY KEY,
//!     resource_id TEXT NOT NULL,
//!     title       TEXT NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL,
//!     metadata    TEXT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ResourceId, ThreadId, Timestamp};
use crate::ports::{ThreadMetadata, ThreadRecord, ThreadStore, ThreadStoreError};

/// PostgreSQL-backed thread store.
#[derive(Clone)]
pub struct PostgresThreadStore {
    pool: PgPool,
}

impl PostgresThreadStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn encode_metadata(metadata: &ThreadMetadata) -> Result<String, ThreadStoreError> {
    serde_json::to_string(metadata).map_err(|e| ThreadStoreError::Serialization(e.to_string()))
}

fn row_to_record(row: sqlx::postgres::PgRow) -> Result<ThreadRecord, ThreadStoreError> {
    let thread_id: String = row
        .try_get("thread_id")
        .map_err(|e| ThreadStoreError::Database(e.to_string()))?;
    let resource_id: String = row
        .try_get("resource_id")
        .map_err(|e| ThreadStoreError::Database(e.to_string()))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| ThreadStoreError::Database(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| ThreadStoreError::Database(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| ThreadStoreError::Database(e.to_string()))?;
    let metadata_text: String = row
        .try_get("metadata")
        .map_err(|e| ThreadStoreError::Database(e.to_string()))?;

    let metadata: ThreadMetadata = serde_json::from_str(&metadata_text)
        .map_err(|e| ThreadStoreError::Serialization(e.to_string()))?;

    Ok(ThreadRecord {
        thread_id: ThreadId::new(thread_id),
        resource_id: ResourceId::new(resource_id),
        title,
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
        metadata,
    })
}

#[async_trait]
impl ThreadStore for PostgresThreadStore {
    async fn get_thread(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Option<ThreadRecord>, ThreadStoreError> {
        let row = sqlx::query(
            r#"
            SELECT thread_id, resource_id, title, created_at, updated_at, metadata
            FROM threads
            WHERE thread_id = $1
            "#,
        )
        .bind(thread_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ThreadStoreError::Database(format!("failed to fetch thread: {e}")))?;

        row.map(row_to_record).transpose()
    }

    async fn create_thread(&self, record: ThreadRecord) -> Result<(), ThreadStoreError> {
        let metadata = encode_metadata(&record.metadata)?;
        sqlx::query(
            r#"
            INSERT INTO threads (thread_id, resource_id, title, created_at, updated_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.thread_id.as_str())
        .bind(record.resource_id.as_str())
        .bind(&record.title)
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .bind(&metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| ThreadStoreError::Database(format!("failed to insert thread: {e}")))?;

        Ok(())
    }

    async fn save_thread(&self, record: ThreadRecord) -> Result<(), ThreadStoreError> {
        let metadata = encode_metadata(&record.metadata)?;
        sqlx::query(
            r#"
            INSERT INTO threads (thread_id, resource_id, title, created_at, updated_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (thread_id) DO UPDATE SET
                resource_id = EXCLUDED.resource_id,
                title = EXCLUDED.title,
                updated_at = EXCLUDED.updated_at,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(record.thread_id.as_str())
        .bind(record.resource_id.as_str())
        .bind(&record.title)
        .bind(record.created_at.as_datetime())
        .bind(record.updated_at.as_datetime())
        .bind(&metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| ThreadStoreError::Database(format!("failed to save thread: {e}")))?;

        Ok(())
    }
}
