use async_trait::async_trait;
use tracing::debug;

use crate::application::VectorStore;
use crate::domain::{Chunk, FileCategory, KnowledgeError, SearchHit};

/// Degraded vector store installed when the backing vector DB is unreachable
/// at startup. Writes are silently accepted, reads return nothing, and the
/// availability probe reports `false` so upstream collaborators skip context
/// injection. The rest of the system keeps serving with lexical retrieval
/// only.
pub struct NoopVectorStore;

impl NoopVectorStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoopVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for NoopVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<(), KnowledgeError> {
        debug!("Vector store degraded, dropping {} chunks", chunks.len());
        Ok(())
    }

    async fn similarity_search(
        &self,
        _user_id: &str,
        _query: &str,
        _top_k: usize,
        _category: Option<FileCategory>,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        Ok(vec![])
    }

    async fn delete(&self, _ids: &[String]) -> Result<(), KnowledgeError> {
        Ok(())
    }

    async fn delete_by_file_path(
        &self,
        _user_id: &str,
        _file_path: &str,
    ) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    async fn delete_by_user(&self, _user_id: &str) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    async fn count_by_user(&self, _user_id: &str) -> Result<u64, KnowledgeError> {
        Ok(0)
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_accepts_writes_and_returns_nothing() {
        let store = NoopVectorStore::new();

        assert!(store.add(&[]).await.is_ok());
        assert!(store
            .similarity_search("u1", "anything", 5, None)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.delete_by_file_path("u1", "/f").await.unwrap(), 0);
        assert!(!store.is_available());
    }
}
