//! Outcome of one migration pass.

use chatstore_core::error::{Result, StoreError};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Files and directories relocated, as (from, to)
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Legacy directories removed after their contents moved out
    pub removed_dirs: Vec<PathBuf>,
    /// Moves that failed; each source was left in place for the next pass
    pub failures: Vec<StoreError>,
    /// Legacy directories that could not be removed, with the reason
    pub cleanup_failures: Vec<(PathBuf, String)>,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the pass changed nothing on disk and hit no move failure.
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty() && self.removed_dirs.is_empty() && self.failures.is_empty()
    }

    /// Fails with the first move failure, if any.
    ///
    /// Cleanup failures are best-effort and never turn into an error.
    pub fn into_result(self) -> Result<Self> {
        match self.failures.first() {
            Some(err) => Err(err.clone()),
            None => Ok(self),
        }
    }

    pub fn merge(&mut self, other: MigrationReport) {
        self.moved.extend(other.moved);
        self.removed_dirs.extend(other.removed_dirs);
        self.failures.extend(other.failures);
        self.cleanup_failures.extend(other.cleanup_failures);
    }
}
