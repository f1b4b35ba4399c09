use std::path::{Path, PathBuf};

/// Produces the authoritative set of indexable files under a workspace root.
///
/// The returned paths are absolute regular files in a stable order. IO errors
/// on individual entries are logged and skipped; an unreadable root yields an
/// empty sequence, not an error.
pub trait FileScanner: Send + Sync {
    fn scan(&self, root: &Path) -> Vec<PathBuf>;
}
