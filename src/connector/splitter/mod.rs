mod enrich;
mod java_ast;
mod recursive;
mod sentence;
mod token;

pub use enrich::{lexical_content, vector_content};
pub use java_ast::JavaAstSplitter;
pub use recursive::RecursiveCharacterSplitter;
pub use sentence::SentenceSplitter;
pub use token::TokenSplitter;

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::application::SplitterService;
use crate::domain::{language_for_path, Chunk, FileCategory, KnowledgeError, Symbol};

/// Intermediate splitter output: content plus position and symbol metadata,
/// before tenant and file metadata are attached.
#[derive(Debug, Clone)]
pub struct ChunkDraft {
    pub content: String,
    pub start_line: u32,
    pub end_line: u32,
    pub symbol: Option<Symbol>,
}

impl ChunkDraft {
    /// Draft without a resolvable position; the range defaults to `(1, 1)`.
    pub fn unpositioned(content: String) -> Self {
        Self {
            content,
            start_line: 1,
            end_line: 1,
            symbol: None,
        }
    }
}

/// The splitter implementations share one `split(content) → drafts` contract;
/// a tagged variant plus factory lookup replaces an inheritance hierarchy.
pub enum SplitterStrategy {
    JavaAst(JavaAstSplitter),
    Token(TokenSplitter),
    Recursive(RecursiveCharacterSplitter),
    Sentence(SentenceSplitter),
}

impl SplitterStrategy {
    pub fn split(&self, content: &str) -> Vec<ChunkDraft> {
        match self {
            SplitterStrategy::JavaAst(s) => s.split(content),
            SplitterStrategy::Token(s) => s.split(content),
            SplitterStrategy::Recursive(s) => s.split(content),
            SplitterStrategy::Sentence(s) => s.split(content),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitterStrategy::JavaAst(_) => "java_ast",
            SplitterStrategy::Token(_) => "token",
            SplitterStrategy::Recursive(_) => "recursive_character",
            SplitterStrategy::Sentence(_) => "sentence",
        }
    }
}

/// Selects a splitter by file extension. Built once at startup from a
/// registered list; unknown extensions fall back to the token splitter.
pub struct SplitterFactory {
    registrations: Vec<(&'static [&'static str], SplitterStrategy)>,
    fallback: SplitterStrategy,
}

impl SplitterFactory {
    pub fn new() -> Self {
        Self {
            registrations: vec![
                (
                    &["java"],
                    SplitterStrategy::JavaAst(JavaAstSplitter::new()),
                ),
                (
                    &["md", "markdown"],
                    SplitterStrategy::Recursive(RecursiveCharacterSplitter::new()),
                ),
                (
                    &["txt", "doc", "docx", "pdf"],
                    SplitterStrategy::Sentence(SentenceSplitter::new()),
                ),
            ],
            fallback: SplitterStrategy::Token(TokenSplitter::new()),
        }
    }

    pub fn strategy_for(&self, path: &Path) -> &SplitterStrategy {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        self.registrations
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map(|(_, strategy)| strategy)
            .unwrap_or(&self.fallback)
    }
}

impl Default for SplitterFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns file content into persisted-ready [`Chunk`]s: strategy selection,
/// splitting, the single-chunk fallback, and metadata attachment.
pub struct SplitterPipeline {
    factory: SplitterFactory,
}

impl SplitterPipeline {
    pub fn new() -> Self {
        Self {
            factory: SplitterFactory::new(),
        }
    }
}

impl Default for SplitterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SplitterService for SplitterPipeline {
    async fn split_file(
        &self,
        user_id: &str,
        file_path: &Path,
        content: &str,
        content_hash: &str,
    ) -> Result<Vec<Chunk>, KnowledgeError> {
        let strategy = self.factory.strategy_for(file_path);
        let mut drafts = strategy.split(content);

        // Fallback chain bottom: a non-blank file always yields one chunk.
        if drafts.is_empty() && !content.trim().is_empty() {
            let end_line = content.lines().count().max(1) as u32;
            drafts.push(ChunkDraft {
                content: content.to_string(),
                start_line: 1,
                end_line,
                symbol: None,
            });
        }

        debug!(
            "Split {} into {} chunks via {}",
            file_path.display(),
            drafts.len(),
            strategy.name()
        );

        let category = FileCategory::from_path(file_path);
        let language = language_for_path(file_path);
        let path_str = file_path.to_string_lossy().to_string();

        let chunks = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                let mut chunk = Chunk::new(
                    user_id.to_string(),
                    path_str.clone(),
                    category,
                    language.to_string(),
                    draft.content,
                    draft.start_line,
                    draft.end_line,
                    content_hash.to_string(),
                    index as u32,
                );
                if let Some(symbol) = draft.symbol {
                    chunk = chunk.with_symbol(symbol);
                }
                chunk
            })
            .collect();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_by_extension() {
        let factory = SplitterFactory::new();
        assert_eq!(factory.strategy_for(Path::new("Foo.java")).name(), "java_ast");
        assert_eq!(
            factory.strategy_for(Path::new("doc.md")).name(),
            "recursive_character"
        );
        assert_eq!(factory.strategy_for(Path::new("notes.txt")).name(), "sentence");
        assert_eq!(factory.strategy_for(Path::new("conf.yml")).name(), "token");
        assert_eq!(factory.strategy_for(Path::new("LICENSE")).name(), "token");
    }

    #[tokio::test]
    async fn test_pipeline_assigns_metadata_and_order() {
        let pipeline = SplitterPipeline::new();
        let content = "line one\nline two";
        let chunks = pipeline
            .split_file("u1", Path::new("/ws/notes.txt"), content, "hash1")
            .await
            .unwrap();

        assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index(), i as u32);
            assert_eq!(chunk.user_id(), "u1");
            assert_eq!(chunk.file_path(), "/ws/notes.txt");
            assert_eq!(chunk.content_hash(), "hash1");
            assert_eq!(chunk.category(), FileCategory::Document);
        }
    }

    #[tokio::test]
    async fn test_pipeline_single_chunk_fallback() {
        let pipeline = SplitterPipeline::new();
        // Whitespace-only content stays empty; non-blank content never does.
        let empty = pipeline
            .split_file("u1", Path::new("/ws/blank.md"), "  \n\n  ", "h")
            .await
            .unwrap();
        assert!(empty.is_empty());
    }
}
