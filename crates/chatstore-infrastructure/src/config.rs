//! Store configuration loaded from TOML.
//!
//! ```toml
//! root = "/var/lib/chatstore/chats"
//! log_window = 1000
//! legacy_owner = "admin"
//! ```
//!
//! Every key is optional. `CHATSTORE_ROOT` overrides `root`.

use crate::paths::{default_root, validate_segment};
use chatstore_core::context::DEFAULT_LOG_WINDOW;
use chatstore_core::error::{Result, StoreError};
use chatstore_core::ownership::DEFAULT_LEGACY_OWNER;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the store root.
pub const ROOT_ENV_VAR: &str = "CHATSTORE_ROOT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the owner partitions
    pub root: PathBuf,
    /// Most recent log items kept per saved context
    pub log_window: usize,
    /// Partition receiving contexts migrated from the owner-less layout
    pub legacy_owner: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            log_window: DEFAULT_LOG_WINDOW,
            legacy_owner: DEFAULT_LEGACY_OWNER.to_string(),
        }
    }
}

impl StoreConfig {
    /// Defaults rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Loads from an optional TOML file, applies the environment override and validates.
    ///
    /// A missing or empty file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) if path.exists() => Self::from_toml_str(&fs::read_to_string(path)?)?,
            _ => Self::default(),
        };
        let config = config.with_root_override(std::env::var_os(ROOT_ENV_VAR).map(PathBuf::from));
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(content)?)
    }

    pub fn with_root_override(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root.filter(|root| !root.as_os_str().is_empty()) {
            self.root = root;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_window == 0 {
            return Err(StoreError::config("log_window must be at least 1"));
        }
        validate_segment(&self.legacy_owner)
            .map_err(|_| StoreError::config(format!("invalid legacy_owner '{}'", self.legacy_owner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.log_window, 1000);
        assert_eq!(config.legacy_owner, "admin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StoreConfig::from_toml_str("log_window = 50\n").unwrap();
        assert_eq!(config.log_window, 50);
        assert_eq!(config.legacy_owner, "admin");
        assert_eq!(config.root, default_root());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chatstore.toml");
        fs::write(&path, "root = \"/srv/chats\"\nlegacy_owner = \"root\"\n").unwrap();

        let config = StoreConfig::from_toml_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/chats"));
        assert_eq!(config.legacy_owner, "root");
    }

    #[test]
    fn test_root_override() {
        let config = StoreConfig::with_root("/a").with_root_override(Some(PathBuf::from("/b")));
        assert_eq!(config.root, PathBuf::from("/b"));

        let config = StoreConfig::with_root("/a").with_root_override(Some(PathBuf::new()));
        assert_eq!(config.root, PathBuf::from("/a"));

        let config = StoreConfig::with_root("/a").with_root_override(None);
        assert_eq!(config.root, PathBuf::from("/a"));
    }

    #[test]
    fn test_validation() {
        let mut config = StoreConfig::with_root("/a");
        config.log_window = 0;
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));

        let mut config = StoreConfig::with_root("/a");
        config.legacy_owner = "../etc".to_string();
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        assert!(matches!(
            StoreConfig::from_toml_str("log_window = \"many\""),
            Err(StoreError::Config(_))
        ));
    }
}
