use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::KnowledgeError;

const DEFAULT_BASE_URL: &str = "http://localhost:1234";
const DEFAULT_MODEL: &str = "bge-m3";
const DEFAULT_DIMENSIONS: usize = 1024;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding client for an OpenAI-compatible `/v1/embeddings` endpoint.
///
/// Local-first: targets `http://localhost:1234` by default. Override with
/// `KNOWLEDGE_EMBEDDING_URL`, `KNOWLEDGE_EMBEDDING_MODEL` and
/// `KNOWLEDGE_EMBEDDING_DIM` to point at any compatible server. The endpoint
/// may be rate-limited; timeouts surface as embedding errors that refresh
/// counts per file and search treats as an empty channel.
pub struct HttpEmbedding {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedding {
    pub fn new(base_url: String, model: String, dimensions: usize) -> Result<Self, KnowledgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                KnowledgeError::embedding(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        })
    }

    pub fn from_env() -> Result<Self, KnowledgeError> {
        let base_url = std::env::var("KNOWLEDGE_EMBEDDING_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("KNOWLEDGE_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let dimensions = std::env::var("KNOWLEDGE_EMBEDDING_DIM")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(DEFAULT_DIMENSIONS);

        Self::new(base_url, model, dimensions)
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingsRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| KnowledgeError::embedding(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::embedding(format!(
                "Embedding endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
            KnowledgeError::embedding(format!("Invalid embedding response: {}", e))
        })?;

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            if vector.len() != self.dimensions {
                return Err(KnowledgeError::embedding(format!(
                    "Expected {}-dimensional embedding, got {}",
                    self.dimensions,
                    vector.len()
                )));
            }
        }

        debug!("Embedded {} texts via {}", vectors.len(), self.model);
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbedding {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = self.request(texts).await?;
        if vectors.len() != texts.len() {
            return Err(KnowledgeError::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, KnowledgeError> {
        let mut vectors = self.request(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| KnowledgeError::embedding("Empty embedding response"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
