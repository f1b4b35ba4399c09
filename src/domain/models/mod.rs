mod chat;
mod chunk;
mod file_category;
mod file_index_state;
mod refresh_report;
mod search_hit;

pub use chat::{ChatMessage, ChatRole};
pub use chunk::{Chunk, Symbol, SymbolKind};
pub use file_category::{language_for_path, FileCategory};
pub use file_index_state::{compute_content_hash, FileIndexState};
pub use refresh_report::RefreshReport;
pub use search_hit::{RetrievalSource, SearchHit};
