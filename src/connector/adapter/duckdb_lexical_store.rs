use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::LexicalStore;
use crate::connector::splitter::lexical_content;
use crate::domain::{Chunk, FileCategory, KnowledgeError, RetrievalSource, SearchHit};

/// Query terms dropped before boolean query construction.
const STOP_WORDS: &[&str] = &[
    "是", "的", "了", "在", "有", "这", "那", "和", "与", "怎么", "如何", "什么", "哪些",
    "为什么",
];

/// DuckDB-backed keyword index over the lexical chunk projection.
///
/// Content is indexed through a CJK-safe tokenization: ASCII word runs stay
/// whole (lowercased) and CJK runs become sliding 2-grams. Relevance is the
/// total term frequency over the matched grams; only strictly positive
/// scores are returned.
pub struct DuckdbLexicalStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbLexicalStore {
    /// Create a new adapter using an existing shared connection.
    pub async fn with_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, KnowledgeError> {
        let conn_guard = conn.lock().await;
        Self::initialize_schema(&conn_guard)?;
        drop(conn_guard);

        Ok(Self { conn })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), KnowledgeError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_fts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                content TEXT NOT NULL,
                content_grams TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_knowledge_fts_user
            ON knowledge_fts(user_id);

            CREATE INDEX IF NOT EXISTS idx_knowledge_fts_user_path
            ON knowledge_fts(user_id, file_path);
            "#,
        )
        .map_err(|e| {
            KnowledgeError::storage(format!("Failed to initialize knowledge_fts schema: {}", e))
        })?;

        debug!("DuckDB knowledge_fts table initialized");
        Ok(())
    }

    fn escape(term: &str) -> String {
        term.replace('\'', "''")
    }
}

#[async_trait]
impl LexicalStore for DuckdbLexicalStore {
    async fn batch_insert(&self, chunks: &[Chunk]) -> Result<(), KnowledgeError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| KnowledgeError::storage(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO knowledge_fts \
                     (id, user_id, file_path, content, content_grams, start_line, end_line) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(|e| {
                    KnowledgeError::storage(format!("Failed to prepare statement: {}", e))
                })?;

            for chunk in chunks {
                let content = lexical_content(chunk);
                let grams = gram_string(&content);
                stmt.execute(params![
                    chunk.id(),
                    chunk.user_id(),
                    chunk.file_path(),
                    content,
                    grams,
                    chunk.start_line() as i64,
                    chunk.end_line() as i64,
                ])
                .map_err(|e| {
                    KnowledgeError::storage(format!("Failed to insert fts row {}: {}", chunk.id(), e))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| KnowledgeError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Saved {} fts rows to DuckDB", chunks.len());
        Ok(())
    }

    async fn full_text_search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, KnowledgeError> {
        let boolean_query = build_boolean_query(query);
        let terms = parse_boolean_query(&boolean_query);
        let grams: Vec<String> = terms.iter().flat_map(|term| tokenize(term)).collect();
        if grams.is_empty() {
            return Ok(vec![]);
        }

        // One frequency expression per gram; a row must contain every gram.
        let mut score_parts: Vec<String> = Vec::new();
        let mut where_parts: Vec<String> = Vec::new();
        for gram in &grams {
            let wrapped = format!(" {} ", Self::escape(gram));
            score_parts.push(format!(
                "(length(content_grams) - length(replace(content_grams, '{w}', ''))) / length('{w}')",
                w = wrapped
            ));
            where_parts.push(format!("content_grams LIKE '%{w}%'", w = wrapped));
        }

        let sql = format!(
            "SELECT id, user_id, file_path, content, start_line, end_line, \
             CAST(({score}) AS FLOAT) AS score \
             FROM knowledge_fts \
             WHERE user_id = ? AND {where_clause} \
             ORDER BY score DESC LIMIT ?",
            score = score_parts.join(" + "),
            where_clause = where_parts.join(" AND "),
        );

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| KnowledgeError::storage(format!("Failed to prepare fts search: {}", e)))?;
        let mut rows = stmt
            .query(params![user_id, limit as i64])
            .map_err(|e| KnowledgeError::storage(format!("Failed to run fts search: {}", e)))?;

        let mut hits = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| KnowledgeError::storage(format!("Failed to read fts row: {}", e)))?
        {
            let score: f32 = row
                .get(6)
                .map_err(|e| KnowledgeError::storage(format!("Failed to read score: {}", e)))?;
            if score <= 0.0 {
                continue;
            }
            let chunk = Chunk::reconstitute(
                row.get::<_, String>(0)
                    .map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?,
                row.get::<_, String>(1)
                    .map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?,
                row.get::<_, String>(2)
                    .map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?,
                FileCategory::Other,
                "Unknown".to_string(),
                row.get::<_, String>(3)
                    .map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?,
                None,
                row.get::<_, i64>(4)
                    .map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?
                    .max(0) as u32,
                row.get::<_, i64>(5)
                    .map_err(|e| KnowledgeError::storage(format!("Failed to read row: {}", e)))?
                    .max(0) as u32,
                String::new(),
                0,
                0,
            );
            hits.push(SearchHit::new(chunk, score, RetrievalSource::Lexical));
        }
        Ok(hits)
    }

    async fn delete_by_file_path(
        &self,
        user_id: &str,
        file_path: &str,
    ) -> Result<u64, KnowledgeError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM knowledge_fts WHERE user_id = ? AND file_path = ?",
                params![user_id, file_path],
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to delete fts rows: {}", e)))?;

        debug!("Deleted {} fts rows for {} {}", deleted, user_id, file_path);
        Ok(deleted as u64)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM knowledge_fts WHERE user_id = ?",
                params![user_id],
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to delete fts rows: {}", e)))?;
        Ok(deleted as u64)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<u64, KnowledgeError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM knowledge_fts WHERE user_id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| KnowledgeError::storage(format!("Failed to count fts rows: {}", e)))?;
        Ok(count as u64)
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'      // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'    // Extension A
        | '\u{3040}'..='\u{30FF}'    // Hiragana + Katakana
    )
}

fn is_word_char(c: char) -> bool {
    !is_cjk(c) && (c.is_alphanumeric() || c == '_')
}

/// CJK-safe tokenization: ASCII word runs are emitted whole (lowercased),
/// CJK runs become sliding 2-grams. Everything else separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    let mut flush_word = |word: &mut String, tokens: &mut Vec<String>| {
        if !word.is_empty() {
            tokens.push(word.to_lowercase());
            word.clear();
        }
    };
    let mut flush_cjk = |run: &mut Vec<char>, tokens: &mut Vec<String>| {
        match run.len() {
            0 => {}
            1 => tokens.push(run[0].to_string()),
            _ => {
                for pair in run.windows(2) {
                    tokens.push(pair.iter().collect());
                }
            }
        }
        run.clear();
    };

    for c in text.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut tokens);
            cjk_run.push(c);
        } else if is_word_char(c) {
            flush_cjk(&mut cjk_run, &mut tokens);
            word.push(c);
        } else {
            flush_word(&mut word, &mut tokens);
            flush_cjk(&mut cjk_run, &mut tokens);
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_cjk(&mut cjk_run, &mut tokens);

    tokens
}

/// Indexed form of a content string: every token wrapped in spaces so exact
/// token occurrences can be counted with plain substring operations.
fn gram_string(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .map(|token| format!(" {} ", token))
        .collect()
}

/// Build the boolean query handed to the keyword search.
///
/// The raw query is split on whitespace and CJK punctuation and stripped of
/// stop words. One surviving term passes through verbatim; two or more are
/// joined with `+` prefixes (conjunction). If everything was filtered out
/// the raw query passes through unchanged.
pub fn build_boolean_query(raw: &str) -> String {
    let terms: Vec<&str> = raw
        .split(|c: char| !is_word_char(c) && !is_cjk(c))
        .filter(|term| !term.is_empty())
        .filter(|term| !STOP_WORDS.contains(term))
        .collect();

    match terms.len() {
        0 => raw.to_string(),
        1 => terms[0].to_string(),
        _ => terms
            .iter()
            .map(|term| format!("+{}", term))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Split a boolean query back into its terms. `+`-prefixed terms are
/// conjunctive; anything else is treated as a single term.
fn parse_boolean_query(boolean_query: &str) -> Vec<String> {
    if boolean_query.contains('+') {
        boolean_query
            .split_whitespace()
            .map(|term| term.trim_start_matches('+').to_string())
            .filter(|term| !term.is_empty())
            .collect()
    } else {
        vec![boolean_query.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_ascii_words() {
        assert_eq!(tokenize("FooService.refresh()"), vec!["fooservice", "refresh"]);
    }

    #[test]
    fn test_tokenize_cjk_bigrams() {
        assert_eq!(tokenize("知识库"), vec!["知识", "识库"]);
        assert_eq!(tokenize("库"), vec!["库"]);
    }

    #[test]
    fn test_tokenize_mixed_script() {
        assert_eq!(
            tokenize("DataSource配置"),
            vec!["datasource", "配置"]
        );
    }

    #[test]
    fn test_boolean_query_single_term() {
        assert_eq!(build_boolean_query("refresh"), "refresh");
    }

    #[test]
    fn test_boolean_query_multi_term_conjunction() {
        assert_eq!(build_boolean_query("index refresh"), "+index +refresh");
        assert_eq!(build_boolean_query("如何 实现 索引"), "+实现 +索引");
    }

    #[test]
    fn test_boolean_query_stop_words_removed() {
        assert_eq!(build_boolean_query("怎么 使用 的 索引"), "+使用 +索引");
    }

    #[test]
    fn test_boolean_query_all_filtered_passes_raw() {
        assert_eq!(build_boolean_query("的 了"), "的 了");
        assert_eq!(build_boolean_query("???"), "???");
    }

    #[test]
    fn test_parse_boolean_query() {
        assert_eq!(parse_boolean_query("+a +b"), vec!["a", "b"]);
        assert_eq!(parse_boolean_query("solo"), vec!["solo"]);
    }

    #[test]
    fn test_gram_string_wraps_tokens() {
        assert_eq!(gram_string("Foo bar"), " foo  bar ");
    }
}
