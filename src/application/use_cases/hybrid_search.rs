use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::{LexicalStore, VectorStore};
use crate::domain::{FileCategory, KnowledgeError, SearchHit};

/// Share of the final quota served from the vector channel.
const VECTOR_SHARE: f64 = 0.50;
/// Share of the final quota served from the lexical channel.
const LEXICAL_SHARE: f64 = 0.25;

/// Fuses dense similarity and keyword retrieval into one ranked list.
///
/// The remaining quarter of the quota is reserved for a "recently indexed"
/// channel that has no backing source yet; the slot stays wired but empty.
pub struct HybridSearchUseCase {
    vector_store: Arc<dyn VectorStore>,
    lexical_store: Arc<dyn LexicalStore>,
}

impl HybridSearchUseCase {
    pub fn new(vector_store: Arc<dyn VectorStore>, lexical_store: Arc<dyn LexicalStore>) -> Self {
        Self {
            vector_store,
            lexical_store,
        }
    }

    /// Quota-split hybrid search. Failures on one channel are logged and
    /// contribute an empty list; they never abort the fusion.
    pub async fn search(
        &self,
        user_id: &str,
        query: &str,
        n_final: usize,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        if user_id.is_empty() {
            return Err(KnowledgeError::TenantMissing);
        }
        if n_final == 0 {
            return Ok(vec![]);
        }

        let start_time = Instant::now();

        let vector_n = ((n_final as f64 * VECTOR_SHARE) as usize).max(1);
        let lexical_n = ((n_final as f64 * LEXICAL_SHARE) as usize).max(1);
        let recent_n = n_final.saturating_sub(vector_n + lexical_n);

        let (vector_hits, lexical_hits) = tokio::join!(
            self.vector_store
                .similarity_search(user_id, query, vector_n, None),
            self.lexical_store.full_text_search(user_id, query, lexical_n),
        );

        let vector_hits = vector_hits.unwrap_or_else(|e| {
            warn!("Vector search failed, continuing without it: {}", e);
            vec![]
        });
        let lexical_hits = lexical_hits.unwrap_or_else(|e| {
            warn!("Lexical search failed, continuing without it: {}", e);
            vec![]
        });
        let recent_hits = self.recently_indexed(user_id, recent_n).await;

        debug!(
            "Hybrid: {} vector + {} lexical + {} recent candidates",
            vector_hits.len(),
            lexical_hits.len(),
            recent_hits.len()
        );

        // Vector hits first so they win the dedup below.
        let merged = vector_hits
            .into_iter()
            .chain(lexical_hits)
            .chain(recent_hits);

        let mut seen: HashSet<(String, u32, u32)> = HashSet::new();
        let mut fused: Vec<SearchHit> = Vec::new();
        for hit in merged {
            if seen.insert(hit.chunk().dedup_key()) {
                fused.push(hit);
            }
            if fused.len() >= n_final {
                break;
            }
        }

        info!(
            "Hybrid search returned {} results in {:.2}s",
            fused.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(fused)
    }

    /// Category-filtered search goes straight to the vector store; the
    /// lexical channel is not consulted and `top_k` is honored verbatim.
    pub async fn search_by_category(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: FileCategory,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        if user_id.is_empty() {
            return Err(KnowledgeError::TenantMissing);
        }
        self.vector_store
            .similarity_search(user_id, query, top_k, Some(category))
            .await
    }

    pub fn vector_available(&self) -> bool {
        self.vector_store.is_available()
    }

    /// Reserved "recently indexed" channel. No source backs it yet, so it
    /// always contributes nothing.
    async fn recently_indexed(&self, _user_id: &str, _quota: usize) -> Vec<SearchHit> {
        vec![]
    }
}
