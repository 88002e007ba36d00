//! Async `ContextRepository` over the blocking directory store.
//!
//! Every call moves onto `tokio::task::spawn_blocking`; the store and the
//! registry are shared with the worker through `Arc`s.

use crate::dir_context_store::DirContextStore;
use async_trait::async_trait;
use chatstore_core::context::Context;
use chatstore_core::error::{Result, StoreError};
use chatstore_core::registry::ContextRegistry;
use chatstore_core::report::RemovalReport;
use chatstore_core::repository::ContextRepository;
use std::sync::Arc;
use tokio::task;

#[derive(Debug, Clone)]
pub struct BlockingContextRepository {
    store: Arc<DirContextStore>,
    registry: Arc<ContextRegistry>,
}

impl BlockingContextRepository {
    pub fn new(store: Arc<DirContextStore>, registry: Arc<ContextRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.registry
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DirContextStore, &ContextRegistry) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        task::spawn_blocking(move || f(&store, &registry))
            .await
            .map_err(|e| StoreError::internal(format!("Failed to spawn blocking task: {}", e)))?
    }
}

#[async_trait]
impl ContextRepository for BlockingContextRepository {
    async fn find_by_id(&self, id: &str, owner: Option<&str>) -> Result<Option<Context>> {
        let id = id.to_string();
        let owner = owner.map(str::to_string);
        self.run(move |store, _| match store.load_one(&id, owner.as_deref()) {
            Ok(context) => Ok(Some(context)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn save(&self, context: Context, owner: Option<&str>) -> Result<Context> {
        let owner = owner.map(str::to_string);
        self.run(move |store, _| {
            let mut context = context;
            store.save(&mut context, owner.as_deref())?;
            Ok(context)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<RemovalReport> {
        let id = id.to_string();
        self.run(move |store, registry| store.delete_context(registry, &id))
            .await
    }

    async fn load_all(&self, owner: Option<&str>, evict_first: bool) -> Result<Vec<String>> {
        let owner = owner.map(str::to_string);
        self.run(move |store, registry| store.load_many(registry, owner.as_deref(), evict_first))
            .await
    }
}
