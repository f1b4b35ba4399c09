use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{EmbeddingService, VectorStore};
use crate::connector::splitter::vector_content;
use crate::domain::{Chunk, FileCategory, KnowledgeError, RetrievalSource, SearchHit};

/// Brute-force cosine store used for tests and `--memory` runs. Behaves like
/// the DuckDB adapter, including the enrichment of persisted content.
pub struct InMemoryVectorStore {
    chunks: Arc<Mutex<HashMap<String, Chunk>>>,
    vectors: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl InMemoryVectorStore {
    pub fn new(embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self {
            chunks: Arc::new(Mutex::new(HashMap::new())),
            vectors: Arc::new(Mutex::new(HashMap::new())),
            embedding_service,
        }
    }

    /// Snapshot of all stored chunks for one user, unranked.
    pub async fn chunks_for_user(&self, user_id: &str) -> Vec<Chunk> {
        let chunks = self.chunks.lock().await;
        chunks
            .values()
            .filter(|chunk| chunk.belongs_to(user_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<(), KnowledgeError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(vector_content).collect();
        let embedded = self.embedding_service.embed_texts(&texts).await?;

        let mut chunk_store = self.chunks.lock().await;
        let mut vector_store = self.vectors.lock().await;
        for ((chunk, text), vector) in chunks.iter().zip(texts).zip(embedded) {
            // Persist the enriched projection, mirroring the real store.
            let enriched = Chunk::reconstitute(
                chunk.id().to_string(),
                chunk.user_id().to_string(),
                chunk.file_path().to_string(),
                chunk.category(),
                chunk.language().to_string(),
                text,
                chunk.symbol().cloned(),
                chunk.start_line(),
                chunk.end_line(),
                chunk.content_hash().to_string(),
                chunk.chunk_index(),
                chunk.created_at(),
            );
            chunk_store.insert(chunk.id().to_string(), enriched);
            vector_store.insert(chunk.id().to_string(), vector);
        }

        debug!("Saved {} chunks to memory", chunks.len());
        Ok(())
    }

    async fn similarity_search(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: Option<FileCategory>,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        let query_vector = self.embedding_service.embed_query(query).await?;

        let scored_ids: Vec<(String, f32)> = {
            let vectors = self.vectors.lock().await;
            let mut scored: Vec<(String, f32)> = vectors
                .iter()
                .map(|(id, vector)| (id.clone(), cosine_similarity(&query_vector, vector)))
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored
        };

        let chunk_store = self.chunks.lock().await;
        let mut hits = Vec::new();
        for (chunk_id, score) in scored_ids {
            if hits.len() >= top_k {
                break;
            }
            let chunk = match chunk_store.get(&chunk_id) {
                Some(chunk) => chunk,
                None => continue,
            };
            if !chunk.belongs_to(user_id) {
                continue;
            }
            if let Some(category) = category {
                if chunk.category() != category {
                    continue;
                }
            }
            hits.push(SearchHit::new(chunk.clone(), score, RetrievalSource::Vector));
        }
        Ok(hits)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), KnowledgeError> {
        let mut chunk_store = self.chunks.lock().await;
        let mut vector_store = self.vectors.lock().await;
        for id in ids {
            chunk_store.remove(id);
            vector_store.remove(id);
        }
        Ok(())
    }

    async fn delete_by_file_path(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<u64, KnowledgeError> {
        let mut chunk_store = self.chunks.lock().await;
        let mut vector_store = self.vectors.lock().await;

        let ids: Vec<String> = chunk_store
            .values()
            .filter(|chunk| chunk.belongs_to(user_id) && chunk.file_path() == file_path)
            .map(|chunk| chunk.id().to_string())
            .collect();

        for id in &ids {
            chunk_store.remove(id);
            vector_store.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let mut chunk_store = self.chunks.lock().await;
        let mut vector_store = self.vectors.lock().await;

        let ids: Vec<String> = chunk_store
            .values()
            .filter(|chunk| chunk.belongs_to(user_id))
            .map(|chunk| chunk.id().to_string())
            .collect();

        for id in &ids {
            chunk_store.remove(id);
            vector_store.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let chunks = self.chunks.lock().await;
        Ok(chunks.values().filter(|c| c.belongs_to(user_id)).count() as u64)
    }
}

/// Cosine similarity in a single pass: dot product and both squared norms
/// accumulate together. Mismatched or zero-norm inputs score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = a.iter().zip(b).fold(
        (0.0f32, 0.0f32, 0.0f32),
        |(dot, na, nb), (x, y)| (dot + x * y, na + x * x, nb + y * y),
    );

    let denominator = (norm_a_sq * norm_b_sq).sqrt();
    if denominator <= f32::EPSILON {
        return 0.0;
    }
    dot / denominator
}
