//! Directory-based context store.
//!
//! Directory structure:
//! ```text
//! root/
//! ├── alice/
//! │   ├── 6f1c…/chat.json
//! │   └── 6f1c…/messages/
//! └── admin/
//!     └── 93ab…/chat.json
//! ```
//!
//! All operations are blocking. Bulk reads run the layout migration first and
//! isolate failures per document; single-document operations propagate them.

use crate::codec::{decode_document, encode_document};
use crate::config::StoreConfig;
use crate::dto::ContextDocument;
use crate::migration::{LayoutMigrator, MigrationReport};
use crate::paths::{DOCUMENT_FILE_NAME, StorePaths, validate_segment};
use crate::serializer::{ContextSerializer, parse_timestamp};
use crate::storage::DocumentFile;
use crate::storage::fs_ops::{file_name_str, list_dirs, remove_path};
use chatstore_core::context::{
    Context, ContextFactory, ContextType, DefaultContextFactory, JsonTranscriptCodec,
    TranscriptCodec,
};
use chatstore_core::error::{Result, StoreError};
use chatstore_core::ownership::{OwnershipDecision, check_owner};
use chatstore_core::registry::{ContextRegistry, write_context};
use chatstore_core::report::RemovalReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Listing entry for one persisted context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSummary {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub context_type: ContextType,
    pub created_at: DateTime<Utc>,
    pub last_message: DateTime<Utc>,
    pub owner: Option<String>,
}

/// Outcome of [`DirContextStore::save_all`].
#[derive(Debug, Default)]
pub struct SaveAllReport {
    pub saved: Vec<String>,
    pub failed: Vec<(String, StoreError)>,
}

/// A decoded document found during enumeration.
struct Candidate {
    path: PathBuf,
    id: String,
    document: ContextDocument,
}

pub struct DirContextStore {
    paths: StorePaths,
    serializer: ContextSerializer,
    factory: Arc<dyn ContextFactory>,
    migrator: LayoutMigrator,
}

impl std::fmt::Debug for DirContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirContextStore")
            .field("paths", &self.paths)
            .field("serializer", &self.serializer)
            .field("factory", &"<dyn ContextFactory>")
            .finish()
    }
}

impl DirContextStore {
    pub fn new(
        config: &StoreConfig,
        transcripts: Arc<dyn TranscriptCodec>,
        factory: Arc<dyn ContextFactory>,
    ) -> Self {
        let paths = StorePaths::new(config.root.clone());
        Self {
            migrator: LayoutMigrator::new(paths.clone(), config.legacy_owner.clone()),
            serializer: ContextSerializer::new(transcripts).with_log_window(config.log_window),
            paths,
            factory,
        }
    }

    /// Store using JSON transcripts and a default agent configuration.
    pub fn with_defaults(config: &StoreConfig) -> Self {
        Self::new(
            config,
            Arc::new(JsonTranscriptCodec),
            Arc::new(DefaultContextFactory::default()),
        )
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Runs the layout migration.
    pub fn migrate(&self) -> MigrationReport {
        self.migrator.run()
    }

    // ============================================================================
    // Save
    // ============================================================================

    /// Persists a context, stamping `owner` into its metadata first when given.
    ///
    /// Returns the written path, or `None` for BACKGROUND contexts, which are
    /// never persisted.
    pub fn save(&self, context: &mut Context, owner: Option<&str>) -> Result<Option<PathBuf>> {
        if !context.is_persistent() {
            tracing::debug!("Not saving background context {}", context.id);
            return Ok(None);
        }

        validate_segment(&context.id)?;
        if let Some(owner) = owner {
            validate_segment(owner)?;
            context.set_owner(owner);
        }
        let owner = context.owner().map(str::to_string);
        if let Some(owner) = owner.as_deref() {
            validate_segment(owner)?;
        }

        let path = self.paths.document_path(&context.id, owner.as_deref());
        let document = self.serializer.to_document(context)?;
        DocumentFile::new(path.clone()).save(&document)?;

        tracing::debug!("Saved context {} to {}", context.id, path.display());
        Ok(Some(path))
    }

    /// Persists every registered context under its recorded owner.
    pub fn save_all(&self, registry: &ContextRegistry) -> SaveAllReport {
        let mut report = SaveAllReport::default();
        for shared in registry.snapshot() {
            let mut context = write_context(&shared);
            match self.save(&mut context, None) {
                Ok(Some(_)) => report.saved.push(context.id.clone()),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to save context {}: {}", context.id, e);
                    report.failed.push((context.id.clone(), e));
                }
            }
        }
        report.saved.sort();
        report
    }

    // ============================================================================
    // Load
    // ============================================================================

    /// Loads one context from `root/{owner}/{id}` (or legacy `root/{id}`).
    ///
    /// The owner comes from the document, whichever partition it sat in.
    pub fn load_one(&self, id: &str, owner: Option<&str>) -> Result<Context> {
        validate_segment(id)?;
        if let Some(owner) = owner {
            validate_segment(owner)?;
        }

        let file = DocumentFile::new(self.paths.document_path(id, owner));
        let document = file
            .load()?
            .ok_or_else(|| StoreError::not_found("context", id))?;
        if !document.is_persistent() {
            return Err(StoreError::not_found("context", id));
        }

        let id = document.id.clone().unwrap_or_else(|| id.to_string());
        self.materialize(document, id)
    }

    /// Loads a context from wherever it is stored.
    ///
    /// With an owner only that partition is consulted; without one every
    /// partition is searched, then the legacy location.
    pub fn find(&self, id: &str, owner: Option<&str>) -> Result<Option<Context>> {
        let owner = match owner {
            Some(owner) => Some(owner.to_string()),
            None => match self.locate(id)? {
                Some(owner) => owner,
                None => return Ok(None),
            },
        };

        match self.load_one(id, owner.as_deref()) {
            Ok(context) => Ok(Some(context)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Partition holding `id`: `Some(Some(owner))`, `Some(None)` for the
    /// legacy location, `None` when absent.
    fn locate(&self, id: &str) -> Result<Option<Option<String>>> {
        validate_segment(id)?;
        for partition in list_dirs(self.paths.root())? {
            let Some(owner) = file_name_str(&partition) else {
                continue;
            };
            if self.paths.document_path(id, Some(owner)).is_file() {
                return Ok(Some(Some(owner.to_string())));
            }
        }
        if self.paths.document_path(id, None).is_file() {
            return Ok(Some(None));
        }
        Ok(None)
    }

    /// Loads every visible context into `registry` and returns their ids.
    ///
    /// With `owner`, only that partition is read and documents recorded as
    /// owned by anyone else are rejected before anything is built. Ownerless
    /// documents are admitted only for the legacy owner. `evict_first` drops that owner's registered contexts beforehand;
    /// it never evicts globally.
    pub fn load_many(
        &self,
        registry: &ContextRegistry,
        owner: Option<&str>,
        evict_first: bool,
    ) -> Result<Vec<String>> {
        if let Some(owner) = owner {
            validate_segment(owner)?;
            if evict_first {
                let evicted = registry.evict_owner(owner);
                tracing::debug!("Evicted {} context(s) of {}", evicted.len(), owner);
            }
        }

        self.migrate();

        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for candidate in self.scan(owner)? {
            if !seen.insert(candidate.id.clone()) {
                tracing::warn!(
                    "Skipping {}: context {} already loaded from another partition",
                    candidate.path.display(),
                    candidate.id
                );
                continue;
            }
            match self.materialize(candidate.document, candidate.id.clone()) {
                Ok(context) => {
                    registry.insert(context);
                    ids.push(candidate.id);
                }
                Err(e) => tracing::warn!("Skipping {}: {}", candidate.path.display(), e),
            }
        }

        tracing::info!("Loaded {} context(s)", ids.len());
        Ok(ids)
    }

    /// Summaries of every visible persisted context, most recent activity first.
    ///
    /// Reads documents without building or registering contexts.
    pub fn summaries(&self, owner: Option<&str>) -> Result<Vec<ContextSummary>> {
        if let Some(owner) = owner {
            validate_segment(owner)?;
        }
        self.migrate();

        let mut summaries = Vec::new();
        for candidate in self.scan(owner)? {
            let source = candidate.path.display().to_string();
            let created_at = parse_timestamp(candidate.document.created_at.as_deref(), &source);
            let last_message = parse_timestamp(candidate.document.last_message.as_deref(), &source);
            let (created_at, last_message) = match (created_at, last_message) {
                (Ok(created_at), Ok(last_message)) => (created_at, last_message),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("Skipping {}: {}", source, e);
                    continue;
                }
            };
            summaries.push(ContextSummary {
                owner: candidate.document.owner().map(str::to_string),
                id: candidate.id,
                name: candidate.document.name,
                context_type: candidate.document.context_type,
                created_at,
                last_message,
            });
        }

        summaries.sort_by(|a, b| {
            b.last_message
                .cmp(&a.last_message)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(summaries)
    }

    /// Decodes every candidate document admitted for `owner`.
    ///
    /// Unreadable or malformed files, BACKGROUND documents and owner
    /// mismatches are skipped.
    fn scan(&self, owner: Option<&str>) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        for path in self.candidate_paths(owner)? {
            let document = match DocumentFile::new(path.clone()).load() {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if !document.is_persistent() {
                tracing::debug!("Skipping background document {}", path.display());
                continue;
            }

            if let OwnershipDecision::Mismatch { found } = check_owner(
                document.owner(),
                owner,
                self.migrator.legacy_owner(),
            ) {
                tracing::info!(
                    "Skipping {} for {}: owned by {}",
                    path.display(),
                    owner.unwrap_or_default(),
                    found.as_deref().unwrap_or("nobody")
                );
                continue;
            }

            let id = match document.id.clone().or_else(|| dir_name_of(&path)) {
                Some(id) => id,
                None => {
                    tracing::warn!("Skipping {}: no usable context id", path.display());
                    continue;
                }
            };
            candidates.push(Candidate { path, id, document });
        }
        Ok(candidates)
    }

    /// `root/{owner}/*/chat.json`, or the same across every partition.
    fn candidate_paths(&self, owner: Option<&str>) -> Result<Vec<PathBuf>> {
        let partitions = match owner {
            Some(owner) => vec![self.paths.user_partition_dir(owner)],
            None => list_dirs(self.paths.root())?,
        };

        let mut paths = Vec::new();
        for partition in partitions {
            match list_dirs(&partition) {
                Ok(dirs) => paths.extend(
                    dirs.into_iter()
                        .map(|dir| dir.join(DOCUMENT_FILE_NAME))
                        .filter(|path| path.is_file()),
                ),
                Err(e) => tracing::warn!("Cannot list {}: {}", partition.display(), e),
            }
        }
        Ok(paths)
    }

    fn materialize(&self, document: ContextDocument, id: String) -> Result<Context> {
        let config = Arc::new(self.factory.agent_config());
        self.serializer.from_document(document, id, config)
    }

    // ============================================================================
    // Import / export
    // ============================================================================

    /// Registers contexts built from exported documents under fresh ids.
    ///
    /// Every document is decoded before anything is registered, so one bad
    /// input leaves the registry untouched. BACKGROUND documents are skipped.
    pub fn import_from_text(
        &self,
        registry: &ContextRegistry,
        texts: &[String],
        owner: Option<&str>,
    ) -> Result<Vec<String>> {
        if let Some(owner) = owner {
            validate_segment(owner)?;
        }

        let documents = texts
            .iter()
            .enumerate()
            .map(|(index, text)| decode_document(text, &format!("import #{}", index)))
            .collect::<Result<Vec<_>>>()?;

        let mut contexts = Vec::with_capacity(documents.len());
        for mut document in documents {
            if !document.is_persistent() {
                tracing::warn!("Ignoring background document on import");
                continue;
            }
            document.id = None;
            let mut context = self.materialize(document, self.factory.new_context_id())?;
            if let Some(owner) = owner {
                context.set_owner(owner);
            }
            contexts.push(context);
        }

        Ok(contexts
            .into_iter()
            .map(|context| {
                let id = context.id.clone();
                registry.insert(context);
                id
            })
            .collect())
    }

    /// Renders a context as its persisted JSON document. Touches no files.
    pub fn export_to_text(&self, context: &Context) -> Result<String> {
        encode_document(&self.serializer.to_document(context)?)
    }

    // ============================================================================
    // Removal
    // ============================================================================

    /// Deletes the context directory from the legacy location and every partition.
    pub fn remove(&self, id: &str) -> Result<RemovalReport> {
        validate_segment(id)?;
        let mut report = RemovalReport::new();

        let legacy_dir = self.paths.context_dir(id, None);
        if !is_partition(&legacy_dir) {
            remove_path(&legacy_dir, &mut report);
        }
        for owner in self.partition_names()? {
            remove_path(&self.paths.context_dir(id, Some(&owner)), &mut report);
        }

        tracing::debug!(
            "Removed context {}: {} removed, {} missing, {} failed",
            id,
            report.removed.len(),
            report.missing.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Deletes the `messages/` directory from the legacy location and every partition.
    pub fn remove_attachments(&self, id: &str) -> Result<RemovalReport> {
        validate_segment(id)?;
        let mut report = RemovalReport::new();

        let legacy_dir = self.paths.context_dir(id, None);
        if !is_partition(&legacy_dir) {
            remove_path(&self.paths.messages_dir(id, None), &mut report);
        }
        for owner in self.partition_names()? {
            remove_path(&self.paths.messages_dir(id, Some(&owner)), &mut report);
        }
        Ok(report)
    }

    /// Removes attachments, then the context itself, then evicts it from `registry`.
    pub fn delete_context(&self, registry: &ContextRegistry, id: &str) -> Result<RemovalReport> {
        let mut report = self.remove_attachments(id)?;
        report.merge(self.remove(id)?);
        registry.remove(id);
        Ok(report)
    }

    fn partition_names(&self) -> Result<Vec<String>> {
        Ok(list_dirs(self.paths.root())?
            .iter()
            .filter_map(|dir| file_name_str(dir).map(str::to_string))
            .collect())
    }
}

/// Name of the directory holding a document path.
fn dir_name_of(document_path: &Path) -> Option<String> {
    document_path
        .parent()
        .and_then(file_name_str)
        .map(str::to_string)
}

/// A directory with context directories below it rather than a document of its own.
fn is_partition(dir: &Path) -> bool {
    dir.is_dir()
        && !dir.join(DOCUMENT_FILE_NAME).exists()
        && list_dirs(dir)
            .map(|dirs| dirs.iter().any(|sub| sub.join(DOCUMENT_FILE_NAME).is_file()))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatstore_core::registry::read_context;
    use std::fs;
    use tempfile::TempDir;

    fn store(temp_dir: &TempDir) -> DirContextStore {
        DirContextStore::with_defaults(&StoreConfig::with_root(temp_dir.path()))
    }

    fn context(id: &str) -> Context {
        Context::new(
            id,
            ContextType::User,
            Arc::new(DefaultContextFactory::default().agent_config()),
        )
    }

    #[test]
    fn test_save_stamps_owner_and_uses_partition() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut ctx = context("c1");

        let path = store.save(&mut ctx, Some("alice")).unwrap().unwrap();

        assert_eq!(path, temp_dir.path().join("alice/c1/chat.json"));
        assert_eq!(ctx.owner(), Some("alice"));
        let loaded = store.load_one("c1", Some("alice")).unwrap();
        assert_eq!(loaded.owner(), Some("alice"));
    }

    #[test]
    fn test_save_without_owner_uses_recorded_owner() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut ctx = context("c1");
        ctx.set_owner("bob");

        let path = store.save(&mut ctx, None).unwrap().unwrap();
        assert_eq!(path, temp_dir.path().join("bob/c1/chat.json"));
    }

    #[test]
    fn test_background_is_never_saved() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut ctx = context("bg");
        ctx.context_type = ContextType::Background;

        assert!(store.save(&mut ctx, Some("alice")).unwrap().is_none());
        assert!(!temp_dir.path().join("alice").exists());
    }

    #[test]
    fn test_load_one_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        assert!(store(&temp_dir).load_one("nope", None).unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalid_segments_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut ctx = context("c1");
        assert!(matches!(
            store.save(&mut ctx, Some("../x")),
            Err(StoreError::InvalidPathSegment(_))
        ));
        assert!(matches!(
            store.remove(".."),
            Err(StoreError::InvalidPathSegment(_))
        ));
    }

    #[test]
    fn test_find_searches_partitions() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.save(&mut context("c1"), Some("dora")).unwrap();

        let found = store.find("c1", None).unwrap().unwrap();
        assert_eq!(found.owner(), Some("dora"));
        assert!(store.find("c1", Some("erin")).unwrap().is_none());
        assert!(store.find("c9", None).unwrap().is_none());
    }

    #[test]
    fn test_load_many_skips_bad_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.save(&mut context("good"), Some("alice")).unwrap();
        fs::create_dir_all(temp_dir.path().join("alice/bad")).unwrap();
        fs::write(temp_dir.path().join("alice/bad/chat.json"), "{ truncated").unwrap();

        let registry = ContextRegistry::new();
        let ids = store.load_many(&registry, Some("alice"), false).unwrap();

        assert_eq!(ids, vec!["good".to_string()]);
        assert_eq!(registry.ids(), vec!["good".to_string()]);
    }

    #[test]
    fn test_load_many_evicts_only_that_owner() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let registry = ContextRegistry::new();
        let mut stale = context("stale");
        stale.set_owner("alice");
        registry.insert(stale);
        let mut other = context("other");
        other.set_owner("bob");
        registry.insert(other);

        store.load_many(&registry, Some("alice"), true).unwrap();

        assert_eq!(registry.ids(), vec!["other".to_string()]);
    }

    #[test]
    fn test_missing_id_falls_back_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("alice/c7");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("chat.json"), r#"{"metadata": {"owner": "alice"}}"#).unwrap();

        let registry = ContextRegistry::new();
        let ids = store(&temp_dir).load_many(&registry, Some("alice"), false).unwrap();
        assert_eq!(ids, vec!["c7".to_string()]);
    }

    #[test]
    fn test_summaries_sorted_by_activity() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut older = context("older");
        older.last_message = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut newer = context("newer");
        newer.last_message = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store.save(&mut older, Some("alice")).unwrap();
        store.save(&mut newer, Some("bob")).unwrap();

        let all = store.summaries(None).unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
        assert_eq!(all[0].owner.as_deref(), Some("bob"));

        let alice = store.summaries(Some("alice")).unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].id, "older");
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let registry = ContextRegistry::new();
        let good = store.export_to_text(&context("x")).unwrap();

        let result = store.import_from_text(&registry, &[good, "{oops".to_string()], None);

        assert!(result.unwrap_err().is_malformed());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_export_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let text = store.export_to_text(&context("c1")).unwrap();

        assert!(text.contains("\"id\": \"c1\""));
        assert!(fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_save_all_uses_recorded_owners() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let registry = ContextRegistry::new();
        let mut owned = context("owned");
        owned.set_owner("alice");
        registry.insert(owned);
        registry.insert(context("loose"));
        let mut bg = context("bg");
        bg.context_type = ContextType::Background;
        registry.insert(bg);

        let report = store.save_all(&registry);

        assert_eq!(report.saved, vec!["loose".to_string(), "owned".to_string()]);
        assert!(report.failed.is_empty());
        assert!(temp_dir.path().join("alice/owned/chat.json").exists());
        assert!(temp_dir.path().join("loose/chat.json").exists());
        assert!(!temp_dir.path().join("bg").exists());
    }

    #[test]
    fn test_delete_context_sweeps_and_evicts() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let registry = ContextRegistry::new();
        let mut ctx = context("c1");
        store.save(&mut ctx, Some("alice")).unwrap();
        fs::create_dir_all(temp_dir.path().join("alice/c1/messages")).unwrap();
        fs::write(temp_dir.path().join("alice/c1/messages/img.png"), "x").unwrap();
        let shared = registry.insert(ctx);
        assert_eq!(read_context(&shared).id, "c1");

        let report = store.delete_context(&registry, "c1").unwrap();

        assert!(report.is_clean());
        assert!(report.removed.contains(&temp_dir.path().join("alice/c1/messages")));
        assert!(report.removed.contains(&temp_dir.path().join("alice/c1")));
        assert!(!temp_dir.path().join("alice/c1").exists());
        assert!(registry.get("c1").is_none());
    }

    #[test]
    fn test_remove_never_deletes_a_partition() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.save(&mut context("c1"), Some("alice")).unwrap();

        let report = store.remove("alice").unwrap();

        assert!(report.removed.is_empty());
        assert!(temp_dir.path().join("alice/c1/chat.json").exists());
    }
}
