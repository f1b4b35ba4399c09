use async_trait::async_trait;

use crate::domain::{FileIndexState, KnowledgeError};

/// Persistence for per-file index state, the authoritative source for
/// detecting modified and removed files between refreshes.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Insert or replace the state row for `(user_id, file_path)`.
    async fn upsert(&self, state: &FileIndexState) -> Result<(), KnowledgeError>;

    async fn find(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<Option<FileIndexState>, KnowledgeError>;

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<FileIndexState>, KnowledgeError>;

    async fn delete(&self, user_id: &str, file_path: &str) -> Result<(), KnowledgeError>;

    async fn delete_by_user(&self, user_id: &str) -> Result<(), KnowledgeError>;

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError>;
}
