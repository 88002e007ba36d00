//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs are the on-disk shape of a context. They are private to the
//! infrastructure layer; the domain model never leaks into the file format.
//!
//! ## Compatibility
//!
//! Every field except `number` of an agent and `type` of a log item is
//! optional on read, so documents written by older releases keep loading:
//! - missing `created_at` / `last_message` → Unix epoch
//! - missing `type` → `user`
//! - missing `log` → fresh log
//! - log item index stored as `no` → accepted as `index`

mod context;

pub use context::{AgentRecord, ContextDocument, LogItemRecord, LogRecord};
