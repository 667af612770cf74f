//! Remote store boundary.
//!
//! The engine never talks a wire protocol. It sees a [`RemoteStore`]: a
//! collection path in, a pullable stream of change batches out, plus
//! create/patch/delete writes. Any backing — hosted document store, a
//! JSON file, an in-memory fake — can sit behind the trait; higher-level
//! concerns (retry, timeouts, auth transport) are layered outside it.
//!
//! [`MemoryStore`] is the in-crate reference implementation.

pub mod memory;

use chrono::{DateTime, Utc};

use crate::model::draft::{ItemDraft, ItemPatch};
use crate::model::item::Item;
use crate::scope::CollectionPath;

pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Change batches
// ---------------------------------------------------------------------------

/// One inbound change notification from the store.
///
/// `added` and `modified` carry full item records (id included, as the
/// store reports them); `removed` carries bare ids. A subscription's
/// first batch is the initial snapshot of the collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeBatch {
    pub added: Vec<Item>,
    pub modified: Vec<Item>,
    pub removed: Vec<String>,
}

impl ChangeBatch {
    /// Whether the batch carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The store (or its transport) is unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The targeted item does not exist in the collection.
    #[error("no such item: {0}")]
    NotFound(String),

    /// The store refused access to the collection.
    #[error("access denied: {0}")]
    Denied(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A live subscription to one collection.
///
/// Dropping the subscription cancels it.
pub trait StoreSubscription {
    /// Drain batches queued since the last poll, oldest first.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the inbound stream has failed; the subscription
    /// is dead afterwards and the caller re-subscribes if it wants more.
    fn poll(&mut self) -> Result<Vec<ChangeBatch>, StoreError>;
}

/// The remote document store collaborator.
pub trait RemoteStore {
    /// Open a subscription to `path`. The first polled batch is the
    /// current snapshot of the collection.
    ///
    /// # Errors
    ///
    /// [`StoreError::Denied`] or [`StoreError::Unavailable`] when the
    /// subscription cannot be established.
    fn subscribe(&self, path: &CollectionPath) -> Result<Box<dyn StoreSubscription>, StoreError>;

    /// Create an item from `draft`, owned by `owner`. The store assigns
    /// the permanent id and both timestamps.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the write is refused.
    fn create(
        &self,
        path: &CollectionPath,
        owner: &str,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError>;

    /// Apply a field-granular patch to an existing item. The store stamps
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id is absent; other variants when
    /// the write is refused.
    fn patch(&self, path: &CollectionPath, id: &str, patch: &ItemPatch)
    -> Result<(), StoreError>;

    /// Delete an item. Deleting an id that is already gone succeeds — the
    /// end state is the same either way.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the write is refused.
    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Server clock
// ---------------------------------------------------------------------------

/// Monotonically non-decreasing timestamp source for store implementations.
///
/// `updated_at`/`created_at` ordering must never run backwards even when
/// the wall clock does: each stamp is `max(now, last + 1µs)`.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last_us: i64,
}

impl MonotonicClock {
    /// A clock that has issued no stamps yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_us: 0 }
    }

    /// Resume from the highest stamp a persisted store has issued.
    #[must_use]
    pub const fn resume_from(last_us: i64) -> Self {
        Self { last_us }
    }

    /// Issue the next stamp.
    pub fn next(&mut self) -> DateTime<Utc> {
        let now_us = Utc::now().timestamp_micros();
        self.last_us = now_us.max(self.last_us + 1);
        DateTime::from_timestamp_micros(self.last_us).unwrap_or_else(Utc::now)
    }

    /// Microseconds of the most recent stamp.
    #[must_use]
    pub const fn last_us(&self) -> i64 {
        self.last_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_reports_empty() {
        assert!(ChangeBatch::default().is_empty());
        let batch = ChangeBatch {
            removed: vec!["srv-1".into()],
            ..ChangeBatch::default()
        };
        assert!(!batch.is_empty());
    }

    #[test]
    fn clock_is_strictly_increasing() {
        let mut clock = MonotonicClock::new();
        let mut last = clock.next();
        for _ in 0..100 {
            let next = clock.next();
            assert!(next > last, "stamps must strictly increase");
            last = next;
        }
    }

    #[test]
    fn clock_resumes_past_persisted_stamp() {
        // Far-future resume point: the next stamp still moves forward.
        let far_future = Utc::now().timestamp_micros() + 60_000_000;
        let mut clock = MonotonicClock::resume_from(far_future);
        let stamp = clock.next();
        assert_eq!(stamp.timestamp_micros(), far_future + 1);
    }
}
