//! In-memory reference store.
//!
//! Backs the engine in tests and in hosts that want a process-local
//! collection. Behaves like the hosted store at the boundary that matters
//! to the engine:
//!
//! - subscriptions get an initial-snapshot batch, then one batch per write
//! - ids are server-assigned (`srv-N`)
//! - timestamps are server-stamped and monotonically non-decreasing
//! - write and subscribe failures can be injected, one-shot, to exercise
//!   rollback and error paths
//!
//! Single-threaded (`Rc`/`RefCell`), matching the engine's concurrency
//! model.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use tracing::debug;

use crate::model::draft::{ItemDraft, ItemPatch};
use crate::model::item::Item;
use crate::scope::CollectionPath;
use crate::store::{ChangeBatch, MonotonicClock, RemoteStore, StoreError, StoreSubscription};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local [`RemoteStore`]. Cloning shares the underlying state, so
/// a test can keep a handle while the engine holds another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<CollectionPath, BTreeMap<String, Item>>,
    subscribers: Vec<Rc<RefCell<SubState>>>,
    clock: MonotonicClock,
    next_id: u64,
    fail_write: Option<String>,
    fail_subscribe: Option<String>,
}

#[derive(Debug)]
struct SubState {
    path: CollectionPath,
    queue: VecDeque<ChangeBatch>,
    open: bool,
}

impl Inner {
    /// Queue `batch` for every open subscriber of `path`.
    fn publish(&mut self, path: &CollectionPath, batch: &ChangeBatch) {
        self.subscribers.retain(|sub| sub.borrow().open);
        for sub in &self.subscribers {
            let mut sub = sub.borrow_mut();
            if sub.path == *path {
                sub.queue.push_back(batch.clone());
            }
        }
    }

    fn take_write_failure(&mut self) -> Result<(), StoreError> {
        match self.fail_write.take() {
            Some(reason) => Err(StoreError::Rejected(reason)),
            None => Ok(()),
        }
    }
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write (create/patch/delete) fail with `reason`.
    pub fn inject_write_failure(&self, reason: impl Into<String>) {
        self.inner.borrow_mut().fail_write = Some(reason.into());
    }

    /// Make the next subscribe fail with `reason`.
    pub fn inject_subscribe_failure(&self, reason: impl Into<String>) {
        self.inner.borrow_mut().fail_subscribe = Some(reason.into());
    }

    /// Server-side view of one item, for assertions.
    #[must_use]
    pub fn stored(&self, path: &CollectionPath, id: &str) -> Option<Item> {
        self.inner
            .borrow()
            .collections
            .get(path)
            .and_then(|c| c.get(id).cloned())
    }

    /// Number of items in one collection.
    #[must_use]
    pub fn collection_len(&self, path: &CollectionPath) -> usize {
        self.inner
            .borrow()
            .collections
            .get(path)
            .map_or(0, BTreeMap::len)
    }

    /// Write an item directly into a collection, as another writer would,
    /// and notify subscribers. Used to simulate concurrent remote writers.
    pub fn seed_remote(&self, path: &CollectionPath, mut item: Item) {
        let mut inner = self.inner.borrow_mut();
        let stamp = inner.clock.next();
        if item.created_at.timestamp_micros() == 0 {
            item.created_at = stamp;
        }
        item.updated_at = stamp;
        let existed = inner
            .collections
            .entry(path.clone())
            .or_default()
            .insert(item.id.clone(), item.clone())
            .is_some();
        let batch = if existed {
            ChangeBatch {
                modified: vec![item],
                ..ChangeBatch::default()
            }
        } else {
            ChangeBatch {
                added: vec![item],
                ..ChangeBatch::default()
            }
        };
        inner.publish(path, &batch);
    }

    /// Delete an item directly, as another writer would.
    pub fn delete_remote(&self, path: &CollectionPath, id: &str) {
        let mut inner = self.inner.borrow_mut();
        if inner
            .collections
            .get_mut(path)
            .and_then(|c| c.remove(id))
            .is_some()
        {
            let batch = ChangeBatch {
                removed: vec![id.to_string()],
                ..ChangeBatch::default()
            };
            inner.publish(path, &batch);
        }
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(&self, path: &CollectionPath) -> Result<Box<dyn StoreSubscription>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(reason) = inner.fail_subscribe.take() {
            return Err(StoreError::Denied(reason));
        }
        let snapshot: Vec<Item> = inner
            .collections
            .get(path)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        debug!(path = %path, items = snapshot.len(), "memory store subscribe");

        let state = Rc::new(RefCell::new(SubState {
            path: path.clone(),
            queue: VecDeque::from([ChangeBatch {
                added: snapshot,
                ..ChangeBatch::default()
            }]),
            open: true,
        }));
        inner.subscribers.push(Rc::clone(&state));
        Ok(Box::new(MemorySubscription { state }))
    }

    fn create(
        &self,
        path: &CollectionPath,
        owner: &str,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.take_write_failure()?;

        inner.next_id += 1;
        let id = format!("srv-{}", inner.next_id);
        let stamp = inner.clock.next();
        let item = Item {
            id: id.clone(),
            name: draft.name.clone(),
            address: draft.address.clone(),
            external_place_ref: draft.external_place_ref.clone(),
            rating: draft.rating,
            price_level: draft.price_level,
            category: draft.category,
            tags: draft.tags.clone(),
            notes: draft.notes.clone(),
            supports_cold_brew: draft.supports_cold_brew,
            coordinates: draft.coordinates,
            owner_id: owner.to_string(),
            created_at: stamp,
            updated_at: stamp,
        };
        inner
            .collections
            .entry(path.clone())
            .or_default()
            .insert(id.clone(), item.clone());
        debug!(path = %path, id = %id, "memory store create");

        let batch = ChangeBatch {
            added: vec![item.clone()],
            ..ChangeBatch::default()
        };
        inner.publish(path, &batch);
        Ok(item)
    }

    fn patch(
        &self,
        path: &CollectionPath,
        id: &str,
        patch: &ItemPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.take_write_failure()?;

        let stamp = inner.clock.next();
        let Some(item) = inner
            .collections
            .get_mut(path)
            .and_then(|c| c.get_mut(id))
        else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        patch.apply_to(item);
        item.updated_at = stamp;
        let updated = item.clone();
        debug!(path = %path, id = %id, "memory store patch");

        let batch = ChangeBatch {
            modified: vec![updated],
            ..ChangeBatch::default()
        };
        inner.publish(path, &batch);
        Ok(())
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.take_write_failure()?;

        if inner
            .collections
            .get_mut(path)
            .and_then(|c| c.remove(id))
            .is_some()
        {
            debug!(path = %path, id = %id, "memory store delete");
            let batch = ChangeBatch {
                removed: vec![id.to_string()],
                ..ChangeBatch::default()
            };
            inner.publish(path, &batch);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySubscription
// ---------------------------------------------------------------------------

struct MemorySubscription {
    state: Rc<RefCell<SubState>>,
}

impl StoreSubscription for MemorySubscription {
    fn poll(&mut self) -> Result<Vec<ChangeBatch>, StoreError> {
        Ok(self.state.borrow_mut().queue.drain(..).collect())
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.state.borrow_mut().open = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
