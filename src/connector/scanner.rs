use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::application::FileScanner;

/// Entry basenames that are never indexed. Directory names in this set prune
/// their entire subtree.
const SKIP_NAMES: &[&str] = &[
    ".git",
    ".idea",
    ".vscode",
    "node_modules",
    "target",
    "build",
    "dist",
    "bin",
    "__pycache__",
    ".DS_Store",
    "Thumbs.db",
];

/// Walks a workspace root and produces the authoritative ordered set of
/// indexable files.
///
/// Rules, applied in order: the hard-coded skip set above, the dotfile rule
/// (any file whose basename starts with `.` is skipped — `.gitignore` itself
/// is read as configuration but not indexed), then the patterns of
/// `<root>/.gitignore` with standard gitignore semantics.
pub struct WorkspaceScanner;

impl WorkspaceScanner {
    pub fn new() -> Self {
        Self
    }

    fn load_gitignore(root: &Path) -> Option<Gitignore> {
        let gitignore_path = root.join(".gitignore");
        if !gitignore_path.is_file() {
            return None;
        }
        let mut builder = GitignoreBuilder::new(root);
        if let Some(e) = builder.add(&gitignore_path) {
            warn!("Failed to read {}: {}", gitignore_path.display(), e);
            return None;
        }
        match builder.build() {
            Ok(gitignore) => {
                debug!("Loaded {} gitignore rules", gitignore.len());
                Some(gitignore)
            }
            Err(e) => {
                warn!("Failed to build gitignore matcher: {}", e);
                None
            }
        }
    }

    fn keep_entry(entry: &DirEntry, root: &Path, gitignore: Option<&Gitignore>) -> bool {
        if entry.path() == root {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        let is_dir = entry.file_type().is_dir();

        if SKIP_NAMES.contains(&name.as_ref()) {
            return false;
        }
        if !is_dir && name.starts_with('.') {
            return false;
        }
        if let Some(gitignore) = gitignore {
            if gitignore.matched(entry.path(), is_dir).is_ignore() {
                return false;
            }
        }
        true
    }
}

impl Default for WorkspaceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner for WorkspaceScanner {
    fn scan(&self, root: &Path) -> Vec<PathBuf> {
        let root = match root.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                warn!("Workspace root {} is not readable: {}", root.display(), e);
                return vec![];
            }
        };
        if !root.is_dir() {
            warn!("Workspace root {} is not a directory", root.display());
            return vec![];
        }

        let gitignore = Self::load_gitignore(&root);

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| Self::keep_entry(entry, &root, gitignore.as_ref()));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry: {}", e),
            }
        }

        debug!("Scanned {} files under {}", files.len(), root.display());
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn scan(root: &Path) -> Vec<String> {
        let root = root.canonicalize().unwrap();
        WorkspaceScanner::new()
            .scan(&root)
            .into_iter()
            .map(|p| {
                p.strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_skip_set_prunes_subtrees() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/Main.java", "class Main {}");
        write(dir.path(), "node_modules/pkg/index.js", "x");
        write(dir.path(), "target/out.class", "x");
        write(dir.path(), ".git/HEAD", "ref");

        let files = scan(dir.path());
        assert_eq!(files, vec!["src/Main.java"]);
    }

    #[test]
    fn test_dotfiles_are_skipped_including_gitignore() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".env", "SECRET=1");
        write(dir.path(), ".gitignore", "");
        write(dir.path(), "README.md", "# hi");

        let files = scan(dir.path());
        assert_eq!(files, vec!["README.md"]);
    }

    #[test]
    fn test_gitignore_directory_pattern_excludes_descendants() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "generated/\n*.log\n");
        write(dir.path(), "generated/deep/Gen.java", "class Gen {}");
        write(dir.path(), "app.log", "log line");
        write(dir.path(), "src/App.java", "class App {}");

        let files = scan(dir.path());
        assert_eq!(files, vec!["src/App.java"]);
    }

    #[test]
    fn test_gitignore_negation() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "*.md\n!KEEP.md\n");
        write(dir.path(), "KEEP.md", "keep");
        write(dir.path(), "drop.md", "drop");

        let files = scan(dir.path());
        assert_eq!(files, vec!["KEEP.md"]);
    }

    #[test]
    fn test_unreadable_root_yields_empty() {
        let files = WorkspaceScanner::new().scan(Path::new("/definitely/not/here"));
        assert!(files.is_empty());
    }
}
