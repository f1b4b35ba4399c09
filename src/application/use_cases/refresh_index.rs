use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::application::{
    FileScanner, LexicalStore, SplitterService, StateStore, VectorStore,
};
use crate::domain::{compute_content_hash, FileIndexState, KnowledgeError, RefreshReport};

/// Outcome of processing a single scanned file.
enum FileOutcome {
    Added,
    Updated,
    Skipped,
}

/// Drives one refresh of a user's workspace: diffs the on-disk tree against
/// the state store and reconciles both backing stores file by file.
pub struct RefreshIndexUseCase {
    scanner: Arc<dyn FileScanner>,
    splitter: Arc<dyn SplitterService>,
    vector_store: Arc<dyn VectorStore>,
    lexical_store: Arc<dyn LexicalStore>,
    state_store: Arc<dyn StateStore>,
}

impl RefreshIndexUseCase {
    pub fn new(
        scanner: Arc<dyn FileScanner>,
        splitter: Arc<dyn SplitterService>,
        vector_store: Arc<dyn VectorStore>,
        lexical_store: Arc<dyn LexicalStore>,
        state_store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            scanner,
            splitter,
            vector_store,
            lexical_store,
            state_store,
        }
    }

    /// Reconcile the workspace at `root` with both stores for `user_id`.
    ///
    /// Per-file failures (read, parse, store write) are counted and logged
    /// but do not abort the batch; listing the state rows for the deletion
    /// pass is a global operation and aborts the refresh on failure.
    pub async fn execute(
        &self,
        user_id: &str,
        root: &Path,
    ) -> Result<RefreshReport, KnowledgeError> {
        if user_id.is_empty() {
            return Err(KnowledgeError::TenantMissing);
        }

        let start_time = Instant::now();
        info!("Refreshing knowledge index for {} at {:?}", user_id, root);

        let files = self.scanner.scan(root);
        info!("Found {} indexable files", files.len());

        let progress_bar = ProgressBar::new(files.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {bar:40.green/dim} {pos}/{len} {msg:.dim}")
                .expect("Invalid progress bar template")
                .progress_chars("━━─"),
        );

        let mut report = RefreshReport::new();
        let mut scanned_paths: HashSet<String> = HashSet::with_capacity(files.len());

        for file in &files {
            let path_str = file.to_string_lossy().to_string();
            progress_bar.set_message(path_str.clone());
            scanned_paths.insert(path_str.clone());

            match self.process_file(user_id, file).await {
                Ok(FileOutcome::Added) => report.added += 1,
                Ok(FileOutcome::Updated) => report.updated += 1,
                Ok(FileOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!("Failed to index {}: {}", path_str, e);
                    report.errors += 1;
                }
            }
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();

        // Deletion pass: state rows whose file no longer exists on disk.
        let state_rows = self.state_store.find_by_user(user_id).await?;
        for row in state_rows {
            if scanned_paths.contains(row.file_path()) {
                continue;
            }
            debug!("Removing deleted file: {}", row.file_path());
            match self.remove_file(user_id, row.file_path()).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("Failed to remove {}: {}", row.file_path(), e);
                    report.errors += 1;
                }
            }
        }

        info!(
            "Refresh complete for {}: {} in {:.2}s",
            user_id,
            report,
            start_time.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Diff one file against its state row and apply the insert, update or
    /// skip path. Within a file the write order is fixed: delete old chunks,
    /// write new chunks to both stores, update the state row last.
    async fn process_file(
        &self,
        user_id: &str,
        file: &Path,
    ) -> Result<FileOutcome, KnowledgeError> {
        let path_str = file.to_string_lossy().to_string();

        let content = tokio::fs::read_to_string(file).await?;
        let content_hash = compute_content_hash(content.as_bytes());

        let existing = self.state_store.find(user_id, &path_str).await?;

        if let Some(ref state) = existing {
            if state.matches_hash(&content_hash) {
                debug!("Unchanged, skipping: {}", path_str);
                return Ok(FileOutcome::Skipped);
            }
            // Changed file: full replacement of all chunks in both stores.
            self.vector_store
                .delete_by_file_path(user_id, &path_str)
                .await?;
            self.lexical_store
                .delete_by_file_path(user_id, &path_str)
                .await?;
        }

        let chunks = self
            .splitter
            .split_file(user_id, file, &content, &content_hash)
            .await?;

        if !chunks.is_empty() {
            self.vector_store.add(&chunks).await?;
            self.lexical_store.batch_insert(&chunks).await?;
        }

        let metadata = tokio::fs::metadata(file).await?;
        let last_modified_at = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let state = FileIndexState::new(
            user_id.to_string(),
            path_str.clone(),
            content_hash,
            metadata.len(),
            last_modified_at,
        );
        self.state_store.upsert(&state).await?;

        debug!("Indexed {} chunks from {}", chunks.len(), path_str);
        if existing.is_some() {
            Ok(FileOutcome::Updated)
        } else {
            Ok(FileOutcome::Added)
        }
    }

    /// Remove every trace of a file: chunks in both stores, then the state
    /// row, so a failed store delete leaves the row for the next refresh.
    async fn remove_file(&self, user_id: &str, file_path: &str) -> Result<(), KnowledgeError> {
        self.vector_store
            .delete_by_file_path(user_id, file_path)
            .await?;
        self.lexical_store
            .delete_by_file_path(user_id, file_path)
            .await?;
        self.state_store.delete(user_id, file_path).await
    }
}
