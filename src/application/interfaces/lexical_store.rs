use async_trait::async_trait;

use crate::domain::{Chunk, KnowledgeError, SearchHit};

/// Tenant-scoped full-text keyword index over chunk content.
#[async_trait]
pub trait LexicalStore: Send + Sync {
    /// Insert or replace rows keyed by chunk id (idempotent upsert). The
    /// stored content is the lexical projection of each chunk.
    async fn batch_insert(&self, chunks: &[Chunk]) -> Result<(), KnowledgeError>;

    /// Keyword search ordered by descending relevance; only strictly
    /// positive-scoring rows are returned. The raw query is turned into a
    /// boolean query by the implementation.
    async fn full_text_search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, KnowledgeError>;

    async fn delete_by_file_path(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<u64, KnowledgeError>;

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError>;

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError>;
}
