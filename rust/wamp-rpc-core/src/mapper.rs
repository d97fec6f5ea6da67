//! Registration ID table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{IdError, MAX_ID, RegistrationId};

/// Bidirectional table between registration IDs and the values they name.
///
/// IDs are handed out from a cursor that walks `1..=limit`. A released ID is
/// only reissued after the cursor has wrapped around the whole domain, and
/// allocation fails instead of wrapping onto a live ID when the domain is full.
///
/// Allocation, resolution and release each take the lock for a single map
/// operation; no lock is held across caller code.
///
/// # Example
///
/// ```rust
/// use wamp_rpc_core::IdMapper;
///
/// let mapper = IdMapper::new();
/// let entry = mapper.allocate_with(|id| (id, "com.example.add")).unwrap();
/// assert_eq!(mapper.resolve(entry.0).unwrap().1, "com.example.add");
/// mapper.release(entry.0).unwrap();
/// assert!(mapper.resolve(entry.0).is_none());
/// ```
pub struct IdMapper<T> {
    state: RwLock<MapperState<T>>,
    limit: u64,
}

struct MapperState<T> {
    entries: HashMap<RegistrationId, Arc<T>>,
    /// Next candidate ID.
    cursor: u64,
}

impl<T> IdMapper<T> {
    /// Create a mapper over the full protocol ID range.
    pub fn new() -> Self {
        Self::with_limit(MAX_ID)
    }

    /// Create a mapper whose IDs stay within `1..=limit`.
    ///
    /// `limit` is clamped to `1..=MAX_ID`.
    pub fn with_limit(limit: u64) -> Self {
        Self {
            state: RwLock::new(MapperState {
                entries: HashMap::new(),
                cursor: 1,
            }),
            limit: limit.clamp(1, MAX_ID),
        }
    }

    /// Allocate a fresh ID and store the value built for it.
    ///
    /// `make` runs under the write lock, so the entry becomes visible to
    /// [`resolve`](Self::resolve) at the same moment the ID is taken.
    pub fn allocate_with(
        &self,
        make: impl FnOnce(RegistrationId) -> T,
    ) -> Result<Arc<T>, IdError> {
        let mut state = self.state.write();

        if state.entries.len() as u64 >= self.limit {
            tracing::warn!(limit = self.limit, "registration ID space exhausted");
            return Err(IdError::Exhausted { limit: self.limit });
        }

        // At least one free ID exists, so this probe terminates.
        let mut candidate = state.cursor;
        while state.entries.contains_key(&RegistrationId(candidate)) {
            candidate = if candidate >= self.limit { 1 } else { candidate + 1 };
        }

        let id = RegistrationId(candidate);
        let value = Arc::new(make(id));
        state.entries.insert(id, value.clone());
        state.cursor = if candidate >= self.limit { 1 } else { candidate + 1 };
        Ok(value)
    }

    /// Look up the value for `id`.
    pub fn resolve(&self, id: RegistrationId) -> Option<Arc<T>> {
        self.state.read().entries.get(&id).cloned()
    }

    /// Remove `id`, returning the value it named.
    pub fn release(&self, id: RegistrationId) -> Result<Arc<T>, IdError> {
        self.state
            .write()
            .entries
            .remove(&id)
            .ok_or(IdError::UnknownId(id.0))
    }

    /// Check whether `id` is live.
    pub fn contains(&self, id: RegistrationId) -> bool {
        self.state.read().entries.contains_key(&id)
    }

    /// Number of live IDs.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// True when no ID is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound of the ID domain.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl<T> Default for IdMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}
