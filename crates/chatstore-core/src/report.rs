//! Reports for best-effort filesystem sweeps.

use std::path::PathBuf;

/// What a best-effort removal did to each location it looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Paths that existed and were deleted
    pub removed: Vec<PathBuf>,
    /// Paths that did not exist
    pub missing: Vec<PathBuf>,
    /// Paths that existed but could not be deleted, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl RemovalReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of locations inspected.
    pub fn inspected(&self) -> usize {
        self.removed.len() + self.missing.len() + self.failed.len()
    }

    pub fn merge(&mut self, other: RemovalReport) {
        self.removed.extend(other.removed);
        self.missing.extend(other.missing);
        self.failed.extend(other.failed);
    }
}
