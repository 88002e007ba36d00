//! Path management for the context store.
//!
//! Resolution is pure path arithmetic; nothing here touches the disk.
//!
//! # Directory Structure
//!
//! ```text
//! root/
//! ├── {owner}/                 # one partition per owner
//! │   └── {context-id}/
//! │       ├── chat.json        # the persisted document
//! │       └── messages/        # attachments
//! ├── {context-id}/chat.json   # legacy, owner-less (migrated to root/admin/)
//! └── {context-id}.json        # legacy, flat (migrated)
//! ```

use chatstore_core::error::{Result, StoreError};
use std::path::{Path, PathBuf};

/// File name of the persisted document inside a context directory.
pub const DOCUMENT_FILE_NAME: &str = "chat.json";

/// Attachment directory inside a context directory.
pub const MESSAGES_DIR_NAME: &str = "messages";

/// Extension of legacy flat documents directly under the root.
pub const FLAT_FILE_EXTENSION: &str = "json";

/// Returns the default store root.
///
/// Uses the platform data directory (e.g. `~/.local/share/chatstore/chats`),
/// falling back to `tmp/chats` relative to the working directory.
pub fn default_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("chatstore").join("chats"))
        .unwrap_or_else(|| PathBuf::from("tmp").join("chats"))
}

/// Rejects ids and owners that would escape their directory.
///
/// A valid segment is non-empty, is not `.` or `..`, and contains no path
/// separator.
pub fn validate_segment(segment: &str) -> Result<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains('\0');
    if invalid {
        return Err(StoreError::InvalidPathSegment(segment.to_string()));
    }
    Ok(())
}

/// Resolves on-disk locations under a store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/{owner}/{id}` when an owner is given, legacy `root/{id}` otherwise.
    pub fn context_dir(&self, id: &str, owner: Option<&str>) -> PathBuf {
        match owner {
            Some(owner) => self.user_partition_dir(owner).join(id),
            None => self.root.join(id),
        }
    }

    pub fn document_path(&self, id: &str, owner: Option<&str>) -> PathBuf {
        self.context_dir(id, owner).join(DOCUMENT_FILE_NAME)
    }

    pub fn messages_dir(&self, id: &str, owner: Option<&str>) -> PathBuf {
        self.context_dir(id, owner).join(MESSAGES_DIR_NAME)
    }

    pub fn user_partition_dir(&self, owner: &str) -> PathBuf {
        self.root.join(owner)
    }

    /// Legacy flat document `root/{id}.json`.
    pub fn flat_file_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, FLAT_FILE_EXTENSION))
    }
}
