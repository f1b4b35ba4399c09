use async_trait::async_trait;
use std::path::Path;

use crate::domain::{Chunk, KnowledgeError};

/// Transforms file content into an ordered sequence of chunks with semantic
/// metadata. `chunk_index` follows the splitter's emission order; callers
/// must not reorder.
#[async_trait]
pub trait SplitterService: Send + Sync {
    async fn split_file(
        &self,
        user_id: &str,
        file_path: &Path,
        content: &str,
        content_hash: &str,
    ) -> Result<Vec<Chunk>, KnowledgeError>;
}
