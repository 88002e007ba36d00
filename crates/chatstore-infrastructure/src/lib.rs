pub mod blocking_context_repository;
pub mod codec;
pub mod config;
pub mod dir_context_store;
pub mod dto;
pub mod migration;
pub mod paths;
pub mod serializer;
pub mod storage;

pub use crate::blocking_context_repository::BlockingContextRepository;
pub use crate::config::StoreConfig;
pub use crate::dir_context_store::{ContextSummary, DirContextStore, SaveAllReport};
pub use crate::migration::{LayoutMigrator, MigrationReport};
pub use crate::paths::StorePaths;
