use async_trait::async_trait;

use crate::domain::KnowledgeError;

/// Generates dense vector embeddings for chunk content and queries.
///
/// Implementations are process-wide and thread-safe; remote backends may be
/// rate-limited, so callers tolerate timeouts surfacing as
/// [`KnowledgeError::EmbeddingError`].
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of already-enriched content strings, one vector each,
    /// in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, KnowledgeError>;

    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}
