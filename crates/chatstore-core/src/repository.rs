//! Async repository interface for context persistence.
//!
//! The store itself is blocking. Services running on an async runtime use
//! this trait through an adapter that offloads each call to a worker thread.

use crate::context::Context;
use crate::error::Result;
use crate::report::RemovalReport;
use async_trait::async_trait;

/// An abstract repository for persisting contexts.
#[async_trait]
pub trait ContextRepository: Send + Sync {
    /// Loads one context.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Context))`: Context found and rebuilt
    /// - `Ok(None)`: No document at the resolved location
    /// - `Err(_)`: The document exists but could not be read or rebuilt
    async fn find_by_id(&self, id: &str, owner: Option<&str>) -> Result<Option<Context>>;

    /// Saves a context, stamping `owner` first when given.
    ///
    /// Returns the context as saved (with the owner stamped).
    async fn save(&self, context: Context, owner: Option<&str>) -> Result<Context>;

    /// Removes a context and its attachments from every location.
    async fn delete(&self, id: &str) -> Result<RemovalReport>;

    /// Loads every visible context into the live registry and returns their ids.
    async fn load_all(&self, owner: Option<&str>, evict_first: bool) -> Result<Vec<String>>;
}
