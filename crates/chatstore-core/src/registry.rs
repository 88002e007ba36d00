//! Live registry of materialized contexts.

use crate::context::Context;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A registered context, shared with whoever is driving it.
pub type SharedContext = Arc<RwLock<Context>>;

/// In-memory registry of live contexts keyed by id.
///
/// Constructed once by the surrounding service and passed to the store
/// operations that register or evict contexts.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: RwLock<HashMap<String, SharedContext>>,
}

/// Read access that survives a panicked writer.
pub fn read_context(shared: &SharedContext) -> RwLockReadGuard<'_, Context> {
    shared.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access that survives a panicked writer.
pub fn write_context(shared: &SharedContext) -> RwLockWriteGuard<'_, Context> {
    shared.write().unwrap_or_else(PoisonError::into_inner)
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> RwLockReadGuard<'_, HashMap<String, SharedContext>> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn map_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, SharedContext>> {
        self.contexts.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gets a registered context by id.
    pub fn get(&self, id: &str) -> Option<SharedContext> {
        self.map().get(id).cloned()
    }

    /// Registers a context, replacing any previous one with the same id.
    pub fn insert(&self, context: Context) -> SharedContext {
        let id = context.id.clone();
        let shared = Arc::new(RwLock::new(context));
        self.map_mut().insert(id, Arc::clone(&shared));
        shared
    }

    pub fn remove(&self, id: &str) -> Option<SharedContext> {
        self.map_mut().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.map().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.map().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All registered contexts.
    pub fn snapshot(&self) -> Vec<SharedContext> {
        self.map().values().cloned().collect()
    }

    /// Evicts every context whose recorded owner is `owner`.
    ///
    /// Returns the evicted ids.
    pub fn evict_owner(&self, owner: &str) -> Vec<String> {
        self.evict_where(|ctx| ctx.owner() == Some(owner))
    }

    /// Evicts every persistent context regardless of owner.
    ///
    /// BACKGROUND contexts stay registered. Returns the evicted ids.
    pub fn evict_all(&self) -> Vec<String> {
        self.evict_where(Context::is_persistent)
    }

    fn evict_where(&self, predicate: impl Fn(&Context) -> bool) -> Vec<String> {
        let mut map = self.map_mut();
        let mut evicted: Vec<String> = map
            .iter()
            .filter(|(_, shared)| predicate(&*read_context(shared)))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &evicted {
            map.remove(id);
        }
        evicted.sort();
        tracing::debug!("Evicted {} contexts from registry", evicted.len());
        evicted
    }
}
