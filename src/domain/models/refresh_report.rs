use serde::{Deserialize, Serialize};

/// Counters emitted by one `refresh` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub added: u64,
    pub updated: u64,
    pub skipped: u64,
    pub deleted: u64,
    pub errors: u64,
}

impl RefreshReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> u64 {
        self.added + self.updated + self.skipped
    }

    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    /// `true` when the run changed nothing, i.e. a second refresh over an
    /// unchanged tree.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.deleted == 0
    }
}

impl std::fmt::Display for RefreshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "added={}, updated={}, skipped={}, deleted={}, errors={}",
            self.added, self.updated, self.skipped, self.deleted, self.errors
        )
    }
}
