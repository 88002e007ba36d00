//! Atomic JSON document file.

use crate::codec::{decode_document, encode_document};
use crate::dto::ContextDocument;
use chatstore_core::error::{Result, StoreError};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// A handle to one persisted `chat.json`.
///
/// Writes go to a hidden temp file in the same directory, are synced, then
/// renamed over the target, so readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and decodes the document.
    ///
    /// - `Ok(Some(doc))`: parsed
    /// - `Ok(None)`: file does not exist
    /// - `Err`: unreadable or malformed
    pub fn load(&self) -> Result<Option<ContextDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        decode_document(&content, &self.path.display().to_string()).map(Some)
    }

    /// Encodes and writes the document atomically, creating parent directories.
    pub fn save(&self, document: &ContextDocument) -> Result<()> {
        let text = encode_document(document)?;
        self.write_text(&text)
    }

    pub fn write_text(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(text.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::io(format!("{} has no parent", self.path.display())))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| StoreError::io(format!("{} has no file name", self.path.display())))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document(id: &str) -> ContextDocument {
        serde_json::from_str(&format!(r#"{{"id": "{}"}}"#, id)).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = DocumentFile::new(temp_dir.path().join("alice/c1/chat.json"));

        file.save(&document("c1")).unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded.id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = DocumentFile::new(temp_dir.path().join("chat.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chat.json");
        let file = DocumentFile::new(path.clone());

        file.save(&document("c1")).unwrap();
        file.save(&document("c2")).unwrap();

        assert!(!temp_dir.path().join(".chat.json.tmp").exists());
        assert_eq!(file.load().unwrap().unwrap().id.as_deref(), Some("c2"));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chat.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(DocumentFile::new(path).load().unwrap_err().is_malformed());
    }
}
