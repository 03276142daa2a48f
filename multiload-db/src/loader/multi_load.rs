use std::collections::HashSet;
use std::marker::PhantomData;
use uuid::Uuid;

use multiload_api::{LoadError, LoadResult};

use crate::models::identifiable::Identifiable;
use crate::repository::find_by_ids::FindByIds;
use crate::repository::transactional::Transactional;
use crate::session::unit_of_work::{SharedEntity, UnitOfWork};

/// Multi-identifier load access over a backing-store session
///
/// Fetches a set of entities by primary key in as few round trips as
/// possible. The identifier list is deduplicated, split into chunks of at
/// most `batch_size` identifiers, and each chunk is fetched with one bulk
/// call on the session. Every fetched entity is attached to the caller's
/// [`UnitOfWork`], so duplicate identifiers and later loads in the same
/// transaction resolve to the same managed instance.
///
/// With `with_session_check(true)`, identifiers already materialized in the
/// unit of work are answered from it without touching the backing store.
/// Such entities are returned exactly as they sit in memory, including local
/// mutations, and are never re-validated against the store: callers trade
/// potential staleness for skipped round trips. The default is to always
/// fetch.
///
/// # Example
/// ```ignore
/// let persons = MultiLoad::new(&store)
///     .with_batch_size(50)
///     .with_session_check(true)
///     .load(&mut uow, &ids)
///     .await?;
/// ```
pub struct MultiLoad<'a, T, S>
where
    T: Identifiable,
    S: FindByIds<T> + Transactional,
{
    store: &'a S,
    batch_size: Option<i32>,
    session_check: bool,
    _entity: PhantomData<fn() -> T>,
}

impl<'a, T, S> MultiLoad<'a, T, S>
where
    T: Identifiable,
    S: FindByIds<T> + Transactional,
{
    /// Create a loader over `store` with no batching and no session check
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            batch_size: None,
            session_check: false,
            _entity: PhantomData,
        }
    }

    /// Limit each backing-store round trip to at most `batch_size` identifiers
    ///
    /// Batching is a performance knob only; the returned entity set does not
    /// depend on it. A non-positive value fails the load with
    /// [`LoadError::InvalidConfiguration`].
    pub fn with_batch_size(mut self, batch_size: i32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Enable or disable resolving identifiers from the unit of work
    pub fn with_session_check(mut self, enabled: bool) -> Self {
        self.session_check = enabled;
        self
    }

    /// Load the entities for `ids`, one managed handle per unique identifier
    ///
    /// Identifiers with no matching row are silently omitted from the
    /// result. Chunks are fetched sequentially, all within the transaction
    /// active on the session; a failed chunk aborts the whole call and the
    /// underlying error is propagated unchanged.
    ///
    /// # Arguments
    /// * `uow` - The unit of work of the active transaction; newly fetched
    ///   entities are attached to it
    /// * `ids` - The requested identifiers; duplicates are permitted
    ///
    /// # Returns
    /// * `Ok(Vec<SharedEntity<T>>)` - Handles for the entities that exist,
    ///   in no particular order
    /// * `Err(LoadError::InvalidConfiguration)` - If the batch size is not positive
    /// * `Err(LoadError::NoActiveTransaction)` - If the session has no open transaction
    /// * `Err(LoadError::BackingStore)` - If a chunk fetch failed
    pub async fn load(
        &self,
        uow: &mut UnitOfWork<T>,
        ids: &[Uuid],
    ) -> LoadResult<Vec<SharedEntity<T>>> {
        let batch_size = match self.batch_size {
            Some(n) if n <= 0 => {
                return Err(LoadError::InvalidConfiguration(format!(
                    "batch size must be positive, got {}",
                    n
                )))
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        if !self.store.in_transaction() {
            return Err(LoadError::NoActiveTransaction);
        }

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(ids.len());
        let mut result = Vec::with_capacity(ids.len());
        let mut pending = Vec::with_capacity(ids.len());

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            if self.session_check {
                if let Some(handle) = uow.get(id) {
                    tracing::debug!(%id, "resolved from unit of work");
                    result.push(handle);
                    continue;
                }
            }
            pending.push(id);
        }

        // One chunk when unbatched; max(1) keeps chunks() well-defined when
        // everything was a cache hit.
        let chunk_size = batch_size.unwrap_or_else(|| pending.len().max(1));
        for chunk in pending.chunks(chunk_size) {
            tracing::debug!(count = chunk.len(), "fetching chunk from backing store");
            let fetched = self
                .store
                .find_by_ids(chunk)
                .await
                .map_err(LoadError::BackingStore)?;
            for entity in fetched {
                result.push(uow.attach(entity));
            }
        }

        Ok(result)
    }
}
