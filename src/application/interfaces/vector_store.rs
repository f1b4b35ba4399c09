use async_trait::async_trait;

use crate::domain::{Chunk, FileCategory, KnowledgeError, SearchHit};

/// Tenant-scoped dense embedding storage with cosine similarity search.
///
/// Every read and write carries a `user_id` filter; cross-tenant leakage is a
/// critical bug. No similarity threshold is applied at this layer — that is a
/// policy of the caller.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed chunk content (enriched projection) and persist it together with
    /// the chunk metadata.
    async fn add(&self, chunks: &[Chunk]) -> Result<(), KnowledgeError>;

    /// Top-`top_k` chunks by cosine similarity for this user, optionally
    /// restricted to one file category.
    async fn similarity_search(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: Option<FileCategory>,
    ) -> Result<Vec<SearchHit>, KnowledgeError>;

    /// Remove chunks by primary key.
    async fn delete(&self, ids: &[String]) -> Result<(), KnowledgeError>;

    /// Remove all chunks for one file of one user. Returns the number of
    /// chunks deleted.
    async fn delete_by_file_path(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<u64, KnowledgeError>;

    /// Remove every chunk belonging to a user. Returns the number deleted.
    async fn delete_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError>;

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError>;

    /// Availability probe. A degraded (no-op) store reports `false` so
    /// upstream collaborators can skip context injection.
    fn is_available(&self) -> bool {
        true
    }
}
