use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::KnowledgeError;

const DEFAULT_DIMENSIONS: usize = 1024;

/// Salt folded into every seed so mock vectors never collide with other
/// hash-derived identifiers of the same text.
const SEED_SALT: u64 = 0x636f_6465_6b62_3031;

/// FNV-1a over the text bytes, mixed with the character count. Enriched
/// projections that differ only in their header (symbol, parent, category
/// label) land on different seeds, so header changes move the vector.
fn seed_for(text: &str) -> u64 {
    let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        seed ^= byte as u64;
        seed = seed.wrapping_mul(0x100_0000_01b3);
    }
    seed ^ (text.chars().count() as u64).rotate_left(17) ^ SEED_SALT
}

/// Deterministic stand-in embedding model: the chunk projection seeds a
/// reproducible unit vector. Identical content always embeds identically,
/// which is what the refresh idempotence tests rely on.
pub struct MockEmbedding {
    dimensions: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed_for(text));
        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| rng.gen::<f32>() - 0.5)
            .collect();

        let norm = vector.iter().fold(0.0f32, |acc, x| acc + x * x).sqrt();
        if norm > f32::EPSILON {
            for x in &mut vector {
                *x /= norm;
            }
        } else if let Some(first) = vector.first_mut() {
            // Degenerate draw: fall back to a basis vector so the result
            // still has unit length.
            *first = 1.0;
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let vectors: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| self.generate_embedding(text))
            .collect();

        debug!("Generated {} mock embeddings", vectors.len());
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, KnowledgeError> {
        Ok(self.generate_embedding(query))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}
