use std::sync::Mutex;

use atlas_layout::{Grouping, Item};

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Persists item embeddings, hints and the last group assignment.
///
/// Implementations must be safe for concurrent use.
/// Use [`MemoryStore`] for in-memory storage (testing/ephemeral).
pub trait EmbeddingStore: Send + Sync {
    /// Inserts or overwrites items by id. New ids are appended, so
    /// [`items`](EmbeddingStore::items) keeps first-insertion order.
    fn put_items(&self, items: &[Item]) -> Result<(), StoreError>;

    /// Returns all stored items in insertion order.
    fn items(&self) -> Result<Vec<Item>, StoreError>;

    /// Returns one stored item.
    fn get(&self, id: &str) -> Result<Option<Item>, StoreError>;

    /// Returns the ids from `ids` that are not stored yet.
    fn missing(&self, ids: &[&str]) -> Result<Vec<String>, StoreError>;

    /// Replaces the stored group assignment and names.
    fn put_grouping(&self, grouping: &Grouping) -> Result<(), StoreError>;

    /// Returns the stored grouping, if any was stored.
    fn grouping(&self) -> Result<Option<Grouping>, StoreError>;

    /// Returns the number of stored items.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Removes all items and the grouping.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory [`EmbeddingStore`] implementation.
/// Data is lost on restart. Suitable for testing or ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmbeddingStore for MemoryStore {
    fn put_items(&self, items: &[Item]) -> Result<(), StoreError> {
        self.inner.lock().unwrap().upsert(items);
        Ok(())
    }

    fn items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.inner.lock().unwrap().items())
    }

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.inner.lock().unwrap().get(id))
    }

    fn missing(&self, ids: &[&str]) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.lock().unwrap().missing(ids))
    }

    fn put_grouping(&self, grouping: &Grouping) -> Result<(), StoreError> {
        self.inner.lock().unwrap().set_grouping(grouping)
    }

    fn grouping(&self) -> Result<Option<Grouping>, StoreError> {
        Ok(self.inner.lock().unwrap().grouping())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().unwrap().len())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.lock().unwrap().clear();
        Ok(())
    }
}
