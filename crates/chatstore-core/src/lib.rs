pub mod context;
pub mod error;
pub mod ownership;
pub mod registry;
pub mod report;
pub mod repository;
pub mod value;

// Re-export common types
pub use context::{Context, ContextType};
pub use error::{Result, StoreError};
pub use ownership::{is_visible, owner_of};
pub use registry::{ContextRegistry, SharedContext};
pub use report::RemovalReport;
pub use repository::ContextRepository;
pub use value::{DataMap, DataValue};
