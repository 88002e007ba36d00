//! Error types for the chatstore crates.

use thiserror::Error;

/// A shared error type for context persistence.
///
/// Typed, structured variants with automatic conversion from the common
/// I/O and serialization errors via `From`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// A persisted document could not be parsed
    #[error("Malformed document {source_name}: {message}")]
    MalformedDocument {
        source_name: String,
        message: String,
    },

    /// A move performed by the layout migration failed; the source is left in place
    #[error("Migration IO error moving {from} -> {to}: {message}")]
    MigrationIo {
        from: String,
        to: String,
        message: String,
    },

    /// The agent chain could not be rebuilt or walked
    #[error("Invalid agent chain: {0}")]
    InvalidChainState(String),

    /// A context id or owner that cannot be used as a single path segment
    #[error("Invalid path segment: '{0}'")]
    InvalidPathSegment(String),

    /// Serialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a MalformedDocument error
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Creates a MigrationIo error
    pub fn migration_io(
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MigrationIo {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidChainState error
    pub fn invalid_chain(message: impl Into<String>) -> Self {
        Self::InvalidChainState(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Check if this is a malformed document error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDocument { .. })
    }

    /// Check if this is a migration move failure
    pub fn is_migration_io(&self) -> bool {
        matches!(self, Self::MigrationIo { .. })
    }

    /// Check if this is a chain rebuild failure
    pub fn is_invalid_chain(&self) -> bool {
        matches!(self, Self::InvalidChainState(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::Io {
                message: format!("File not found: {}", err),
            };
        }
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A type alias for `Result<T, StoreError>`.
pub type Result<T> = std::result::Result<T, StoreError>;
