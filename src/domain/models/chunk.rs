use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::FileCategory;

/// The smallest retrievable unit of knowledge: a contiguous piece of a source
/// file plus the metadata needed to rank, filter and render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    user_id: String,
    file_path: String,
    category: FileCategory,
    language: String,
    content: String,
    symbol: Option<Symbol>,
    start_line: u32,
    end_line: u32,
    content_hash: String,
    chunk_index: u32,
    created_at: i64,
}

impl Chunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        file_path: String,
        category: FileCategory,
        language: String,
        content: String,
        start_line: u32,
        end_line: u32,
        content_hash: String,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            file_path,
            category,
            language,
            content,
            symbol: None,
            start_line,
            end_line,
            content_hash,
            chunk_index,
            created_at: epoch_millis(),
        }
    }

    /// Reconstitutes from persisted data (used by adapters).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        user_id: String,
        file_path: String,
        category: FileCategory,
        language: String,
        content: String,
        symbol: Option<Symbol>,
        start_line: u32,
        end_line: u32,
        content_hash: String,
        chunk_index: u32,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            user_id,
            file_path,
            category,
            language,
            content,
            symbol,
            start_line,
            end_line,
            content_hash,
            chunk_index,
            created_at,
        }
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Basename of the originating file, used by the enrichment headers.
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_path)
    }

    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }

    /// Identity used by the hybrid fuser to collapse duplicates across
    /// retrieval channels.
    pub fn dedup_key(&self) -> (String, u32, u32) {
        (self.file_path.clone(), self.start_line, self.end_line)
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Named program element a chunk was carved from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    parent: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Interface,
    Method,
    Field,
    Enum,
    Annotation,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Enum => "enum",
            SymbolKind::Annotation => "annotation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "class" => Some(SymbolKind::Class),
            "interface" => Some(SymbolKind::Interface),
            "method" => Some(SymbolKind::Method),
            "field" => Some(SymbolKind::Field),
            "enum" => Some(SymbolKind::Enum),
            "annotation" => Some(SymbolKind::Annotation),
            _ => None,
        }
    }

    /// Human-readable Chinese label used by the enrichment header.
    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Class => "类",
            SymbolKind::Interface => "接口",
            SymbolKind::Method => "方法",
            SymbolKind::Field => "字段",
            SymbolKind::Enum => "枚举",
            SymbolKind::Annotation => "注解",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub(crate) fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
