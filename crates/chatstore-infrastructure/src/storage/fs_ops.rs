//! Filesystem helpers shared by the store and the layout migration.

use chatstore_core::error::{Result, StoreError};
use chatstore_core::report::RemovalReport;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn migration_error(from: &Path, to: &Path, err: impl ToString) -> StoreError {
    StoreError::migration_io(
        from.display().to_string(),
        to.display().to_string(),
        err.to_string(),
    )
}

/// Moves a file, overwriting `to`.
///
/// Tries a rename first. Across filesystems it copies, checks the copy's size
/// against the source, and only then deletes the source.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| migration_error(from, to, e))?;
    }

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let copied = fs::copy(from, to).map_err(|e| migration_error(from, to, e))?;
    let expected = fs::metadata(from)
        .map_err(|e| migration_error(from, to, e))?
        .len();
    let written = fs::metadata(to).map_err(|e| migration_error(from, to, e))?.len();
    if copied != expected || written != expected {
        return Err(migration_error(
            from,
            to,
            format!("copy verification failed ({} of {} bytes)", written, expected),
        ));
    }

    fs::remove_file(from).map_err(|e| migration_error(from, to, e))
}

/// Moves a directory tree to `to`, which must not exist yet.
///
/// Falls back to a recursive copy followed by removal of the source.
pub fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| migration_error(from, to, e))?;
    }

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    copy_dir(from, to).map_err(|e| migration_error(from, to, e))?;
    fs::remove_dir_all(from).map_err(|e| migration_error(from, to, e))
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Removes a file or directory tree, recording the outcome.
///
/// A path that does not exist is recorded as missing, not as a failure.
pub fn remove_path(path: &Path, report: &mut RemovalReport) {
    let result = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            report.missing.push(path.to_path_buf());
            return;
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => report.removed.push(path.to_path_buf()),
        Err(e) => {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
            report.failed.push((path.to_path_buf(), e.to_string()));
        }
    }
}

/// Immediate subdirectories of `dir`, sorted. A missing `dir` has none.
pub fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    list_entries(dir, |path| path.is_dir())
}

/// Immediate files of `dir` with the given extension, sorted.
pub fn list_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    list_entries(dir, |path| {
        path.is_file() && path.extension().is_some_and(|ext| ext == extension)
    })
}

fn list_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Last component of a path as UTF-8, if it has one.
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
