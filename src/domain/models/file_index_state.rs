use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authoritative record that a file has been indexed for a user.
///
/// `(user_id, file_path)` is the logical primary key; `content_hash` is the
/// dedup witness holding the hash of the last successfully persisted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileIndexState {
    id: String,
    user_id: String,
    file_path: String,
    content_hash: String,
    file_size: u64,
    last_modified_at: i64,
}

impl FileIndexState {
    pub fn new(
        user_id: String,
        file_path: String,
        content_hash: String,
        file_size: u64,
        last_modified_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            file_path,
            content_hash,
            file_size,
            last_modified_at,
        }
    }

    /// Reconstitutes from persisted data (used by adapters).
    pub fn reconstitute(
        id: String,
        user_id: String,
        file_path: String,
        content_hash: String,
        file_size: u64,
        last_modified_at: i64,
    ) -> Self {
        Self {
            id,
            user_id,
            file_path,
            content_hash,
            file_size,
            last_modified_at,
        }
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

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn last_modified_at(&self) -> i64 {
        self.last_modified_at
    }

    pub fn matches_hash(&self, hash: &str) -> bool {
        self.content_hash == hash
    }
}

/// Computes the MD5 hash of a file's full content.
///
/// Hashing is file-level, not chunk-level: all chunks of a changed file are
/// replaced together.
pub fn compute_content_hash(content: &[u8]) -> String {
    let hash = Md5::digest(content);
    format!("{:x}", hash)
}
