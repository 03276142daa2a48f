use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use multiload_db::models::identifiable::Identifiable;
use multiload_db::repository::find_by_id::FindById;
use multiload_db::repository::find_by_ids::FindByIds;
use multiload_db::repository::transactional::Transactional;

/// In-memory backing-store session
///
/// Holds rows in a process-local map and exposes the same session surface a
/// database-backed store would: an explicit transaction boundary plus
/// single and bulk fetch by identifier. Every fetch outside a transaction
/// is rejected.
///
/// The store keeps instrumentation for tests: the number of fetch round
/// trips, the identifier set of each bulk round trip, and a one-shot fault
/// that makes the next fetch fail.
pub struct InMemoryStore<T: Identifiable + Clone> {
    rows: RwLock<HashMap<Uuid, T>>,
    tx_active: Mutex<bool>,
    fetch_calls: AtomicUsize,
    recorded_batches: Mutex<Vec<Vec<Uuid>>>,
    fail_next_fetch: Mutex<Option<String>>,
}

impl<T: Identifiable + Clone> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            tx_active: Mutex::new(false),
            fetch_calls: AtomicUsize::new(0),
            recorded_batches: Mutex::new(Vec::new()),
            fail_next_fetch: Mutex::new(None),
        }
    }

    /// Seed one row, replacing any previous row with the same identifier
    pub fn insert(&self, entity: T) {
        self.rows.write().insert(entity.get_id(), entity);
    }

    /// Seed a batch of rows
    pub fn insert_all(&self, entities: Vec<T>) {
        let mut rows = self.rows.write();
        for entity in entities {
            rows.insert(entity.get_id(), entity);
        }
    }

    /// Number of fetch round trips issued so far (single and bulk)
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Identifier sets of the bulk round trips, in call order
    pub fn recorded_batches(&self) -> Vec<Vec<Uuid>> {
        self.recorded_batches.lock().clone()
    }

    /// Make the next fetch fail with `message` instead of returning rows
    pub fn fail_next_fetch(&self, message: &str) {
        *self.fail_next_fetch.lock() = Some(message.to_string());
    }

    fn take_fault(&self) -> Option<String> {
        self.fail_next_fetch.lock().take()
    }

    fn ensure_in_transaction(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if *self.tx_active.lock() {
            Ok(())
        } else {
            Err("No active transaction on session".into())
        }
    }
}

impl<T: Identifiable + Clone> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Identifiable + Clone + Send + Sync> FindById<T> for InMemoryStore<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, Box<dyn Error + Send + Sync>> {
        self.ensure_in_transaction()?;
        if let Some(message) = self.take_fault() {
            return Err(message.into());
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.read().get(&id).cloned())
    }
}

#[async_trait]
impl<T: Identifiable + Clone + Send + Sync> FindByIds<T> for InMemoryStore<T> {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<T>, Box<dyn Error + Send + Sync>> {
        self.ensure_in_transaction()?;
        if let Some(message) = self.take_fault() {
            return Err(message.into());
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_batches.lock().push(ids.to_vec());
        tracing::debug!(count = ids.len(), "bulk fetch");

        let rows = self.rows.read();
        let mut seen = HashSet::with_capacity(ids.len());
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(entity) = rows.get(id) {
                found.push(entity.clone());
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl<T: Identifiable + Clone + Send + Sync> Transactional for InMemoryStore<T> {
    async fn begin_transaction(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut tx = self.tx_active.lock();
        if *tx {
            return Err("Transaction already active on session".into());
        }
        *tx = true;
        Ok(())
    }

    async fn commit(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut tx = self.tx_active.lock();
        if !*tx {
            return Err("No active transaction on session".into());
        }
        *tx = false;
        Ok(())
    }

    async fn close(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        *self.tx_active.lock() = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        *self.tx_active.lock()
    }
}
