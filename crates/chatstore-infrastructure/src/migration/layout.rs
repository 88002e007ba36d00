//! Upgrades the two historical on-disk layouts to per-owner partitions.
//!
//! ```text
//! root/{id}.json          ──flat──▶   root/{id}/chat.json
//! root/{id}/chat.json     ──owner──▶  root/{legacy_owner}/{id}/chat.json
//! root/{id}/messages/     ──owner──▶  root/{legacy_owner}/{id}/messages/
//! ```
//!
//! Every step is keyed on what currently exists on disk, so a pass after a
//! partial failure picks up where the last one stopped and a pass over a
//! converged tree does nothing.

use super::report::MigrationReport;
use crate::paths::{DOCUMENT_FILE_NAME, FLAT_FILE_EXTENSION, MESSAGES_DIR_NAME, StorePaths};
use crate::storage::fs_ops::{file_name_str, list_dirs, list_files_with_extension, move_dir, move_file};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LayoutMigrator {
    paths: StorePaths,
    legacy_owner: String,
}

impl LayoutMigrator {
    pub fn new(paths: StorePaths, legacy_owner: impl Into<String>) -> Self {
        Self {
            paths,
            legacy_owner: legacy_owner.into(),
        }
    }

    /// Partition that receives ownerless contexts.
    pub fn legacy_owner(&self) -> &str {
        &self.legacy_owner
    }

    /// Runs both steps in order. Never fails as a whole; see the report.
    pub fn run(&self) -> MigrationReport {
        let mut report = self.migrate_flat_files();
        report.merge(self.migrate_ownerless_dirs());

        if !report.moved.is_empty() {
            tracing::info!(
                "Layout migration moved {} item(s) under {}",
                report.moved.len(),
                self.paths.root().display()
            );
        }
        for failure in &report.failures {
            tracing::warn!("Layout migration: {}", failure);
        }
        report
    }

    /// `root/{id}.json` → `root/{id}/chat.json`.
    pub fn migrate_flat_files(&self) -> MigrationReport {
        let mut report = MigrationReport::new();

        let files = match list_files_with_extension(self.paths.root(), FLAT_FILE_EXTENSION) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", self.paths.root().display(), e);
                return report;
            }
        };

        for file in files {
            let Some(id) = file.file_stem().and_then(|stem| stem.to_str()) else {
                tracing::warn!("Skipping non UTF-8 file name {}", file.display());
                continue;
            };
            let target = self.paths.document_path(id, None);
            match move_file(&file, &target) {
                Ok(()) => {
                    tracing::debug!("Moved {} -> {}", file.display(), target.display());
                    report.moved.push((file.clone(), target));
                }
                Err(e) => report.failures.push(e),
            }
        }
        report
    }

    /// `root/{id}/chat.json` → `root/{legacy_owner}/{id}/chat.json`, carrying
    /// `messages/` along, then removes the emptied legacy directory.
    pub fn migrate_ownerless_dirs(&self) -> MigrationReport {
        let mut report = MigrationReport::new();

        let dirs = match list_dirs(self.paths.root()) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", self.paths.root().display(), e);
                return report;
            }
        };

        for dir in dirs {
            let legacy_document = dir.join(DOCUMENT_FILE_NAME);
            if !legacy_document.is_file() {
                continue;
            }
            let Some(id) = file_name_str(&dir) else {
                tracing::warn!("Skipping non UTF-8 directory {}", dir.display());
                continue;
            };

            let target = self.paths.document_path(id, Some(&self.legacy_owner));
            if let Err(e) = move_file(&legacy_document, &target) {
                report.failures.push(e);
                continue;
            }
            tracing::debug!("Moved {} -> {}", legacy_document.display(), target.display());
            report.moved.push((legacy_document, target));

            self.carry_messages(&dir, id, &mut report);
            remove_emptied_dir(&dir, &mut report);
        }
        report
    }

    fn carry_messages(&self, legacy_dir: &Path, id: &str, report: &mut MigrationReport) {
        let legacy_messages = legacy_dir.join(MESSAGES_DIR_NAME);
        if !legacy_messages.is_dir() {
            return;
        }
        let target = self.paths.messages_dir(id, Some(&self.legacy_owner));
        if target.exists() {
            tracing::warn!(
                "Leaving {} in place: {} already exists",
                legacy_messages.display(),
                target.display()
            );
            return;
        }
        match move_dir(&legacy_messages, &target) {
            Ok(()) => report.moved.push((legacy_messages, target)),
            Err(e) => report.failures.push(e),
        }
    }
}

/// Removes a legacy directory only if nothing is left in it.
fn remove_emptied_dir(dir: &Path, report: &mut MigrationReport) {
    match fs::remove_dir(dir) {
        Ok(()) => report.removed_dirs.push(dir.to_path_buf()),
        Err(e) => {
            tracing::warn!("Could not remove legacy directory {}: {}", dir.display(), e);
            report.cleanup_failures.push((dir.to_path_buf(), e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatstore_core::ownership::DEFAULT_LEGACY_OWNER;
    use tempfile::TempDir;

    fn migrator(temp_dir: &TempDir) -> LayoutMigrator {
        LayoutMigrator::new(StorePaths::new(temp_dir.path()), DEFAULT_LEGACY_OWNER)
    }

    #[test]
    fn test_flat_file_ends_in_admin_partition() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("c1.json"), r#"{"id":"c1"}"#).unwrap();

        let report = migrator(&temp_dir).run();

        assert!(report.failures.is_empty());
        assert!(!temp_dir.path().join("c1.json").exists());
        assert!(!temp_dir.path().join("c1").exists());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("admin/c1/chat.json")).unwrap(),
            r#"{"id":"c1"}"#
        );
    }

    #[test]
    fn test_messages_carried_along() {
        let temp_dir = TempDir::new().unwrap();
        let legacy = temp_dir.path().join("c2");
        fs::create_dir_all(legacy.join("messages")).unwrap();
        fs::write(legacy.join("chat.json"), "{}").unwrap();
        fs::write(legacy.join("messages/m.txt"), "m").unwrap();

        let report = migrator(&temp_dir).run();

        assert!(report.cleanup_failures.is_empty());
        assert_eq!(report.removed_dirs, vec![legacy.clone()]);
        assert!(!legacy.exists());
        assert!(temp_dir.path().join("admin/c2/chat.json").exists());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("admin/c2/messages/m.txt")).unwrap(),
            "m"
        );
    }

    #[test]
    fn test_partitions_are_left_alone() {
        let temp_dir = TempDir::new().unwrap();
        let owned = temp_dir.path().join("alice/c3");
        fs::create_dir_all(&owned).unwrap();
        fs::write(owned.join("chat.json"), "{}").unwrap();

        let report = migrator(&temp_dir).run();

        assert!(report.is_noop());
        assert!(owned.join("chat.json").exists());
    }

    #[test]
    fn test_second_pass_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("c1.json"), "{}").unwrap();
        fs::create_dir_all(temp_dir.path().join("c2")).unwrap();
        fs::write(temp_dir.path().join("c2/chat.json"), "{}").unwrap();

        assert!(!migrator(&temp_dir).run().is_noop());
        assert!(migrator(&temp_dir).run().is_noop());
    }

    #[test]
    fn test_leftover_content_is_cleanup_failure() {
        let temp_dir = TempDir::new().unwrap();
        let legacy = temp_dir.path().join("c4");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("chat.json"), "{}").unwrap();
        fs::write(legacy.join("notes.txt"), "keep").unwrap();

        let report = migrator(&temp_dir).run();

        assert!(report.failures.is_empty());
        assert_eq!(report.cleanup_failures.len(), 1);
        assert!(legacy.join("notes.txt").exists());
        assert!(temp_dir.path().join("admin/c4/chat.json").exists());
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let migrator = LayoutMigrator::new(StorePaths::new(temp_dir.path().join("absent")), "admin");
        assert!(migrator.run().is_noop());
    }
}
