use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::StateStore;
use crate::domain::{FileIndexState, KnowledgeError};

/// DuckDB-backed per-file index state, the authoritative deletion source for
/// the refresh diff.
pub struct DuckdbStateStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbStateStore {
    /// Create a new adapter using an existing shared connection.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, KnowledgeError> {
        let conn_guard = conn.lock().await;
        Self::initialize_schema(&conn_guard)?;
        drop(conn_guard);

        Ok(Self { conn })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), KnowledgeError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS file_index_state (
                id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                file_size BIGINT NOT NULL,
                last_modified_at BIGINT NOT NULL,
                PRIMARY KEY (user_id, file_path)
            );

            CREATE INDEX IF NOT EXISTS idx_file_index_state_user
            ON file_index_state(user_id);
            "#,
        )
        .map_err(|e| {
            KnowledgeError::storage(format!("Failed to initialize file_index_state schema: {}", e))
        })?;

        debug!("DuckDB file_index_state table initialized");
        Ok(())
    }

    fn row_to_state(row: &duckdb::Row) -> Result<FileIndexState, duckdb::Error> {
        Ok(FileIndexState::reconstitute(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?.max(0) as u64,
            row.get::<_, i64>(5)?,
        ))
    }
}

#[async_trait]
impl StateStore for DuckdbStateStore {
    async fn upsert(&self, state: &FileIndexState) -> Result<(), KnowledgeError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO file_index_state \
             (id, user_id, file_path, content_hash, file_size, last_modified_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                state.id(),
                state.user_id(),
                state.file_path(),
                state.content_hash(),
                state.file_size() as i64,
                state.last_modified_at(),
            ],
        )
        .map_err(|e| KnowledgeError::storage(format!("Failed to upsert index state: {}", e)))?;

        Ok(())
    }

    async fn find(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<Option<FileIndexState>, KnowledgeError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, file_path, content_hash, file_size, last_modified_at \
                 FROM file_index_state WHERE user_id = ? AND file_path = ?",
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to prepare statement: {}", e)))?;

        let mut rows = stmt
            .query_map(params![user_id, file_path], Self::row_to_state)
            .map_err(|e| KnowledgeError::storage(format!("Failed to query index state: {}", e)))?;

        match rows.next() {
            Some(row) => Ok(Some(row.map_err(|e| {
                KnowledgeError::storage(format!("Failed to read row: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<FileIndexState>, KnowledgeError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, file_path, content_hash, file_size, last_modified_at \
                 FROM file_index_state WHERE user_id = ? ORDER BY file_path",
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], Self::row_to_state)
            .map_err(|e| KnowledgeError::storage(format!("Failed to query index state: {}", e)))?;

        let mut states = Vec::new();
        for row in rows {
            states
                .push(row.map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(states)
    }

    async fn delete(&self, user_id: &str, file_path: &str) -> Result<(), KnowledgeError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM file_index_state WHERE user_id = ? AND file_path = ?",
            params![user_id, file_path],
        )
        .map_err(|e| KnowledgeError::storage(format!("Failed to delete index state: {}", e)))?;

        debug!("Deleted index state for {} {}", user_id, file_path);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<(), KnowledgeError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM file_index_state WHERE user_id = ?",
            params![user_id],
        )
        .map_err(|e| KnowledgeError::storage(format!("Failed to delete index state: {}", e)))?;

        debug!("Deleted all index state for user {}", user_id);
        Ok(())
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM file_index_state WHERE user_id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to count index state: {}", e)))?;
        Ok(count as u64)
    }
}
