use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Shared handle to an entity managed by a [`UnitOfWork`]
///
/// All lookups of the same identifier within one unit of work resolve to the
/// same handle, so a mutation through one handle is visible through every
/// other handle to that entity.
pub type SharedEntity<T> = Arc<RwLock<T>>;

/// Per-transaction cache of materialized entities
///
/// A unit of work is created when a transaction starts and discarded when it
/// ends. It maps each identifier to the single in-memory instance of that
/// entity for the duration of the transaction. It is exclusively owned by
/// the thread driving the transaction; it is never shared across concurrent
/// transactions.
///
/// Entities read from the cache are returned as-is, without re-validation
/// against the backing store. Between attaching an entity and reading it
/// back, the underlying row may have changed; callers opting into
/// cache reads accept that staleness in exchange for skipping the fetch.
pub struct UnitOfWork<T: Identifiable> {
    entities: HashMap<Uuid, SharedEntity<T>>,
}

impl<T: Identifiable> UnitOfWork<T> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    /// Returns the cached handle for `id`, if the entity is materialized
    pub fn get(&self, id: Uuid) -> Option<SharedEntity<T>> {
        self.entities.get(&id).cloned()
    }

    /// Whether an entity with `id` is materialized in this unit of work
    pub fn contains(&self, id: Uuid) -> bool {
        self.entities.contains_key(&id)
    }

    /// Register a freshly fetched entity and return its managed handle
    ///
    /// If the identifier is already materialized, the existing handle is
    /// refreshed in place with the new state instead of being replaced, so
    /// handles held from earlier lookups keep observing the managed entity.
    pub fn attach(&mut self, entity: T) -> SharedEntity<T> {
        let id = entity.get_id();
        match self.entities.get(&id) {
            Some(existing) => {
                *existing.write() = entity;
                Arc::clone(existing)
            }
            None => {
                let handle = Arc::new(RwLock::new(entity));
                self.entities.insert(id, Arc::clone(&handle));
                handle
            }
        }
    }

    /// Remove an entity from this unit of work, returning its handle
    pub fn evict(&mut self, id: Uuid) -> Option<SharedEntity<T>> {
        self.entities.remove(&id)
    }

    /// Drop every materialized entity
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T: Identifiable> Default for UnitOfWork<T> {
    fn default() -> Self {
        Self::new()
    }
}
