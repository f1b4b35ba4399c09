use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{EmbeddingService, VectorStore};
use crate::connector::splitter::vector_content;
use crate::domain::{
    Chunk, FileCategory, KnowledgeError, RetrievalSource, SearchHit, Symbol, SymbolKind,
};

/// Broad-search cap used to emulate delete-by-filter for a single file.
/// Correct while per-file chunk counts stay well below the cap.
const FILE_DELETE_CAP: usize = 1000;
/// Broad-search cap used to emulate delete-by-filter for a whole tenant.
const USER_DELETE_CAP: usize = 10000;

/// DuckDB VSS-backed dense embedding store for the `copilot_knowledge`
/// collection. Embeds the enriched chunk projection through the injected
/// embedding model and searches by cosine similarity under a mandatory
/// `user_id` filter.
pub struct DuckdbVectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    dimensions: usize,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl DuckdbVectorStore {
    pub fn new(
        path: &Path,
        collection: &str,
        dimensions: usize,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Result<Self, KnowledgeError> {
        let conn = Connection::open(path)
            .map_err(|e| KnowledgeError::unavailable(format!("Failed to open vector DB: {}", e)))?;
        Self::initialize(&conn, collection, dimensions)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
            dimensions,
            embedding_service,
        })
    }

    #[allow(dead_code)]
    pub fn in_memory(
        collection: &str,
        dimensions: usize,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Result<Self, KnowledgeError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            KnowledgeError::unavailable(format!("Failed to open in-memory vector DB: {}", e))
        })?;
        Self::initialize(&conn, collection, dimensions)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
            dimensions,
            embedding_service,
        })
    }

    /// Installs the VSS extension and auto-initializes the collection schema.
    fn initialize(
        conn: &Connection,
        collection: &str,
        dimensions: usize,
    ) -> Result<(), KnowledgeError> {
        debug!("Initializing vector collection: {}", collection);

        conn.execute_batch(
            "INSTALL vss; LOAD vss; SET hnsw_enable_experimental_persistence = true;",
        )
        .map_err(|e| {
            KnowledgeError::unavailable(format!("Failed to initialize VSS extension: {}", e))
        })?;

        let schema_sql = format!(
            r#"
            CREATE SCHEMA IF NOT EXISTS "{collection}";

            CREATE TABLE IF NOT EXISTS "{collection}".chunks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL,
                language TEXT NOT NULL,
                content TEXT NOT NULL,
                symbol_name TEXT,
                symbol_kind TEXT,
                symbol_parent TEXT,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                content_hash TEXT NOT NULL,
                created_at BIGINT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS "{collection}".embeddings (
                chunk_id TEXT PRIMARY KEY,
                vector FLOAT[{dimensions}] NOT NULL,
                model TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS embedding_hnsw_idx
            ON "{collection}".embeddings USING HNSW (vector) WITH (metric = 'cosine');
            "#,
            collection = collection,
            dimensions = dimensions,
        );

        conn.execute_batch(&schema_sql).map_err(|e| {
            KnowledgeError::unavailable(format!("Failed to initialize vector schema: {}", e))
        })?;

        debug!("Vector collection schema initialized");
        Ok(())
    }

    fn vector_to_array_literal(&self, vector: &[f32]) -> Result<String, KnowledgeError> {
        if vector.len() != self.dimensions {
            return Err(KnowledgeError::invalid_input(format!(
                "Expected embedding dimension {}, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        let mut literal = String::with_capacity(vector.len() * 8);
        literal.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                literal.push_str(", ");
            }
            literal.push_str(&format!("{}", v));
        }
        literal.push(']');
        literal.push_str(&format!("::FLOAT[{}]", self.dimensions));
        Ok(literal)
    }

    fn row_to_chunk(row: &Row) -> Result<Chunk, duckdb::Error> {
        let symbol_name: Option<String> = row.get(6)?;
        let symbol_kind: Option<String> = row.get(7)?;
        let symbol_parent: Option<String> = row.get(8)?;

        let symbol = match (symbol_name, symbol_kind) {
            (Some(name), Some(kind)) => SymbolKind::parse(&kind).map(|kind| {
                let mut symbol = Symbol::new(name, kind);
                if let Some(parent) = symbol_parent {
                    symbol = symbol.with_parent(parent);
                }
                symbol
            }),
            _ => None,
        };

        Ok(Chunk::reconstitute(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            FileCategory::parse(&row.get::<_, String>(3)?).unwrap_or(FileCategory::Other),
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            symbol,
            u32::try_from(row.get::<_, i64>(9)?).unwrap_or(1),
            u32::try_from(row.get::<_, i64>(10)?).unwrap_or(1),
            row.get::<_, String>(12)?,
            u32::try_from(row.get::<_, i64>(11)?).unwrap_or(0),
            row.get::<_, i64>(13)?,
        ))
    }

    /// Collect ids through a broad filtered lookup, capped at `cap` rows.
    /// This emulates delete-by-filter on stores that only delete by primary
    /// key.
    async fn collect_ids(
        &self,
        user_id: &str,
        file_path: Option<&str>,
        cap: usize,
    ) -> Result<Vec<String>, KnowledgeError> {
        let conn = self.conn.lock().await;
        let sql = match file_path {
            Some(_) => format!(
                "SELECT id FROM \"{}\".chunks WHERE user_id = ? AND file_path = ? LIMIT {}",
                self.collection, cap
            ),
            None => format!(
                "SELECT id FROM \"{}\".chunks WHERE user_id = ? LIMIT {}",
                self.collection, cap
            ),
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| KnowledgeError::storage(format!("Failed to prepare id lookup: {}", e)))?;

        let mut ids = Vec::new();
        match file_path {
            Some(path) => {
                let rows = stmt
                    .query_map(params![user_id, path], |row| row.get::<_, String>(0))
                    .map_err(|e| KnowledgeError::storage(format!("Failed to query ids: {}", e)))?;
                for row in rows {
                    ids.push(row.map_err(|e| {
                        KnowledgeError::storage(format!("Failed to read id: {}", e))
                    })?);
                }
            }
            None => {
                let rows = stmt
                    .query_map(params![user_id], |row| row.get::<_, String>(0))
                    .map_err(|e| KnowledgeError::storage(format!("Failed to query ids: {}", e)))?;
                for row in rows {
                    ids.push(row.map_err(|e| {
                        KnowledgeError::storage(format!("Failed to read id: {}", e))
                    })?);
                }
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl VectorStore for DuckdbVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<(), KnowledgeError> {
        if chunks.is_empty() {
            return Ok(());
        }

        // Enrichment is part of the persisted payload: what gets embedded is
        // what gets stored and later returned.
        let texts: Vec<String> = chunks.iter().map(vector_content).collect();
        let vectors = self.embedding_service.embed_texts(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(KnowledgeError::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| KnowledgeError::storage(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT OR REPLACE INTO \"{}\".chunks \
                     (id, user_id, file_path, file_type, language, content, \
                      symbol_name, symbol_kind, symbol_parent, \
                      start_line, end_line, chunk_index, content_hash, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    self.collection
                ))
                .map_err(|e| {
                    KnowledgeError::storage(format!("Failed to prepare chunk insert: {}", e))
                })?;

            for (chunk, text) in chunks.iter().zip(texts.iter()) {
                stmt.execute(params![
                    chunk.id(),
                    chunk.user_id(),
                    chunk.file_path(),
                    chunk.category().as_str(),
                    chunk.language(),
                    text,
                    chunk.symbol().map(|s| s.name()),
                    chunk.symbol().map(|s| s.kind().as_str()),
                    chunk.symbol().and_then(|s| s.parent()),
                    chunk.start_line() as i64,
                    chunk.end_line() as i64,
                    chunk.chunk_index() as i64,
                    chunk.content_hash(),
                    chunk.created_at(),
                ])
                .map_err(|e| {
                    KnowledgeError::storage(format!("Failed to insert chunk {}: {}", chunk.id(), e))
                })?;
            }
        }

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let array_lit = self.vector_to_array_literal(vector)?;
            // The array literal must be part of the SQL statement because the
            // fixed-size FLOAT[] type does not support parameterization. The
            // literal is built from our own embedding output, not user input.
            let sql = format!(
                "INSERT OR REPLACE INTO \"{}\".embeddings (chunk_id, vector, model) \
                 VALUES (?, {}, ?)",
                self.collection, array_lit
            );
            tx.execute(
                &sql,
                params![chunk.id(), self.embedding_service.model_name()],
            )
            .map_err(|e| {
                KnowledgeError::storage(format!(
                    "Failed to insert embedding for chunk {}: {}",
                    chunk.id(),
                    e
                ))
            })?;
        }

        tx.commit()
            .map_err(|e| KnowledgeError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Saved {} chunks to vector collection", chunks.len());
        Ok(())
    }

    async fn similarity_search(
        &self,
        user_id: &str,
        query: &str,
        top_k: usize,
        category: Option<FileCategory>,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        if top_k == 0 {
            return Ok(vec![]);
        }

        let query_vector = self.embedding_service.embed_query(query).await?;
        let array_lit = self.vector_to_array_literal(&query_vector)?;

        let mut sql = format!(
            "SELECT \
                c.id, c.user_id, c.file_path, c.file_type, c.language, c.content, \
                c.symbol_name, c.symbol_kind, c.symbol_parent, \
                c.start_line, c.end_line, c.chunk_index, c.content_hash, c.created_at, \
                1.0 - array_cosine_distance(e.vector, {array_lit}) AS score \
             FROM \"{collection}\".embeddings e \
             JOIN \"{collection}\".chunks c ON c.id = e.chunk_id \
             WHERE c.user_id = ?",
            array_lit = array_lit,
            collection = self.collection,
        );
        if let Some(category) = category {
            sql.push_str(&format!(
                " AND c.file_type = '{}'",
                category.as_str()
            ));
        }
        sql.push_str(&format!(
            " ORDER BY array_cosine_distance(e.vector, {array_lit}) LIMIT ?",
            array_lit = array_lit
        ));

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql).map_err(|e| {
            KnowledgeError::storage(format!("Failed to prepare similarity search: {}", e))
        })?;
        let mut rows = stmt.query(params![user_id, top_k as i64]).map_err(|e| {
            KnowledgeError::storage(format!("Failed to run similarity search: {}", e))
        })?;

        let mut hits = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| KnowledgeError::storage(format!("Failed to read result row: {}", e)))?
        {
            let score: f32 = row
                .get(14)
                .map_err(|e| KnowledgeError::storage(format!("Failed to read score: {}", e)))?;
            let chunk = Self::row_to_chunk(row)
                .map_err(|e| KnowledgeError::storage(format!("Failed to parse chunk row: {}", e)))?;
            hits.push(SearchHit::new(chunk, score, RetrievalSource::Vector));
        }
        Ok(hits)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), KnowledgeError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| KnowledgeError::storage(format!("Failed to begin transaction: {}", e)))?;

        for id in ids {
            tx.execute(
                &format!(
                    "DELETE FROM \"{}\".embeddings WHERE chunk_id = ?",
                    self.collection
                ),
                params![id],
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to delete embedding: {}", e)))?;
            tx.execute(
                &format!("DELETE FROM \"{}\".chunks WHERE id = ?", self.collection),
                params![id],
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to delete chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| KnowledgeError::storage(format!("Failed to commit: {}", e)))?;
        Ok(())
    }

    async fn delete_by_file_path(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<u64, KnowledgeError> {
        let ids = self
            .collect_ids(user_id, Some(file_path), FILE_DELETE_CAP)
            .await?;
        let count = ids.len() as u64;
        self.delete(&ids).await?;

        debug!(
            "Deleted {} vector chunks for {} {}",
            count, user_id, file_path
        );
        Ok(count)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let ids = self.collect_ids(user_id, None, USER_DELETE_CAP).await?;
        let count = ids.len() as u64;
        self.delete(&ids).await?;

        debug!("Deleted {} vector chunks for user {}", count, user_id);
        Ok(count)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM \"{}\".chunks WHERE user_id = ?",
                    self.collection
                ),
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to count chunks: {}", e)))?;
        Ok(count as u64)
    }
}
