use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::{
    EmbeddingService, FileScanner, HybridSearchUseCase, LexicalStore, RefreshIndexUseCase,
    SplitterService, StateStore, VectorStore,
};
use crate::connector::adapter::{
    DuckdbLexicalStore, DuckdbStateStore, DuckdbVectorStore, HttpEmbedding, InMemoryVectorStore,
    MockEmbedding, NoopVectorStore,
};
use crate::connector::agent::{ContextInjectionHook, SearchKnowledgeTool};
use crate::connector::scanner::WorkspaceScanner;
use crate::connector::splitter::SplitterPipeline;

const DEFAULT_COLLECTION: &str = "copilot_knowledge";

pub struct ContainerConfig {
    pub data_dir: String,
    /// Vector collection (schema) name.
    pub collection: String,
    pub mock_embeddings: bool,
    /// Keep vectors in memory instead of the DuckDB collection.
    pub memory_storage: bool,
}

impl ContainerConfig {
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            collection: DEFAULT_COLLECTION.to_string(),
            mock_embeddings: false,
            memory_storage: false,
        }
    }
}

/// Wires adapters to use cases. The vector store handle is process-wide
/// state: when its backing DB cannot be opened the no-op variant is
/// installed once at construction and the availability flag stays false for
/// the life of the process.
pub struct Container {
    embedding_service: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    lexical_store: Arc<dyn LexicalStore>,
    state_store: Arc<dyn StateStore>,
    scanner: Arc<dyn FileScanner>,
    splitter: Arc<dyn SplitterService>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        // Embedding model: process-wide, shared by the vector store.
        let embedding_service: Arc<dyn EmbeddingService> = if config.mock_embeddings {
            debug!("Using mock embedding service");
            Arc::new(MockEmbedding::new())
        } else {
            debug!("Using HTTP embedding service");
            Arc::new(HttpEmbedding::from_env()?)
        };
        let dimensions = embedding_service.dimensions();

        // Relational side: state rows and the lexical index share one
        // connection (one write connection per DuckDB file).
        let relational_path = PathBuf::from(&config.data_dir).join("knowledge.duckdb");
        let conn = Connection::open(&relational_path)?;
        let shared_conn = Arc::new(Mutex::new(conn));
        let state_store: Arc<dyn StateStore> =
            Arc::new(DuckdbStateStore::with_connection(Arc::clone(&shared_conn)).await?);
        let lexical_store: Arc<dyn LexicalStore> =
            Arc::new(DuckdbLexicalStore::with_connection(shared_conn).await?);

        // Vector side: its own database file so an unreachable vector
        // backend degrades to the no-op store while lexical retrieval keeps
        // serving.
        let vector_store: Arc<dyn VectorStore> = if config.memory_storage {
            debug!("Using in-memory vector storage");
            Arc::new(InMemoryVectorStore::new(embedding_service.clone()))
        } else {
            let vector_path =
                PathBuf::from(&config.data_dir).join(format!("{}.duckdb", config.collection));
            match DuckdbVectorStore::new(
                &vector_path,
                &config.collection,
                dimensions,
                embedding_service.clone(),
            ) {
                Ok(store) => {
                    debug!(
                        "Using DuckDB vector storage at {:?} collection {}",
                        vector_path, config.collection
                    );
                    Arc::new(store)
                }
                Err(e) => {
                    warn!(
                        "Vector store unavailable ({}). Continuing with lexical-only retrieval.",
                        e
                    );
                    Arc::new(NoopVectorStore::new())
                }
            }
        };

        Ok(Self {
            embedding_service,
            vector_store,
            lexical_store,
            state_store,
            scanner: Arc::new(WorkspaceScanner::new()),
            splitter: Arc::new(SplitterPipeline::new()),
            config,
        })
    }

    pub fn refresh_use_case(&self) -> Arc<RefreshIndexUseCase> {
        Arc::new(RefreshIndexUseCase::new(
            self.scanner.clone(),
            self.splitter.clone(),
            self.vector_store.clone(),
            self.lexical_store.clone(),
            self.state_store.clone(),
        ))
    }

    pub fn search_use_case(&self) -> Arc<HybridSearchUseCase> {
        Arc::new(HybridSearchUseCase::new(
            self.vector_store.clone(),
            self.lexical_store.clone(),
        ))
    }

    pub fn hook(&self) -> ContextInjectionHook {
        ContextInjectionHook::new(self.search_use_case())
    }

    pub fn tool(&self) -> SearchKnowledgeTool {
        SearchKnowledgeTool::new(self.search_use_case())
    }

    pub fn embedding_service(&self) -> Arc<dyn EmbeddingService> {
        self.embedding_service.clone()
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn lexical_store(&self) -> Arc<dyn LexicalStore> {
        self.lexical_store.clone()
    }

    pub fn state_store(&self) -> Arc<dyn StateStore> {
        self.state_store.clone()
    }

    pub fn data_dir(&self) -> &str {
        &self.config.data_dir
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }
}
