//! Conversion between live contexts and their persisted documents.
//!
//! - `agents`: flatten/rebuild the delegation chain
//! - `log`: flatten/rebuild the bounded activity log
//! - `context`: whole-context conversion built on the two above

pub mod agents;
pub mod context;
pub mod log;

pub use context::{ContextSerializer, format_timestamp, parse_timestamp};
