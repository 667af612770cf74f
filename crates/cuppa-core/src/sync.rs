//! Subscription lifecycle and the canonical mirror.
//!
//! The [`SyncEngine`] owns the mirror: an ordered mapping of item id →
//! [`Item`] reflecting one bound remote collection. Everything else reads
//! snapshots; all writes — server batches and optimistic patches alike —
//! go through this one exclusive path.
//!
//! # Generations
//!
//! Every `bind` increments a generation counter and cancels the previous
//! subscription *before* opening the new one. Deliveries carry the
//! generation they were issued under; [`SyncEngine::apply_remote`]
//! discards anything stale, so a late batch from an old scope can never
//! write into the new scope's mirror.
//!
//! # Optimistic reconciliation
//!
//! Optimistic mutations are recorded as pending operations alongside the
//! mirror write:
//!
//! - a server upsert **supersedes** optimistic state per field: the server
//!   record is taken, then any still-pending patches for the same id are
//!   replayed over it, so a newer unacknowledged local edit survives until
//!   its own confirmation lands;
//! - a rejected patch rolls back exactly the fields it touched, except
//!   fields a newer pending patch has since claimed;
//! - a rejected delete restores the item from its retained prior value;
//! - a confirmed create atomically swaps the temporary entry for the
//!   server one.
//!
//! The mirror version increments on every mutation; projections key their
//! memoization on it.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::EngineError;
use crate::model::draft::ItemPatch;
use crate::model::item::Item;
use crate::scope::ViewScope;
use crate::store::{ChangeBatch, RemoteStore, StoreSubscription};

// ---------------------------------------------------------------------------
// Status & handle
// ---------------------------------------------------------------------------

/// Subscription status, surfaced to the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// No scope bound.
    #[default]
    Idle,
    /// Subscribed, waiting for the initial snapshot.
    Subscribing,
    /// At least one batch applied; mirror reflects the collection.
    Synced,
    /// The inbound stream failed; mirror frozen at last good state.
    Error(String),
}

/// Proof of a successful bind, carrying the subscription generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    generation: u64,
}

impl SubscriptionHandle {
    /// The generation this subscription was issued under.
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

// ---------------------------------------------------------------------------
// Pending optimistic operations
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PendingOp {
    seq: u64,
    generation: u64,
    kind: PendingKind,
}

#[derive(Debug)]
enum PendingKind {
    /// Optimistic create under a temporary id.
    Create { temp_id: String },
    /// Optimistic field patch with its rollback record.
    Patch {
        id: String,
        new: ItemPatch,
        prior: ItemPatch,
    },
    /// Optimistic delete retaining the entry for undo.
    Remove { id: String, prior: Item },
}

// ---------------------------------------------------------------------------
// SyncEngine
// ---------------------------------------------------------------------------

/// Owner of the mirror and the subscription lifecycle.
pub struct SyncEngine {
    store: Rc<dyn RemoteStore>,
    mirror: BTreeMap<String, Item>,
    subscription: Option<Box<dyn StoreSubscription>>,
    generation: u64,
    version: u64,
    status: SyncStatus,
    pending: Vec<PendingOp>,
    next_seq: u64,
}

impl SyncEngine {
    /// An idle engine over `store`; nothing is bound yet.
    pub fn new(store: Rc<dyn RemoteStore>) -> Self {
        Self {
            store,
            mirror: BTreeMap::new(),
            subscription: None,
            generation: 0,
            version: 0,
            status: SyncStatus::Idle,
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Bind `scope`: cancel any existing subscription, then subscribe to
    /// the scope's collection under a fresh generation.
    ///
    /// # Errors
    ///
    /// [`EngineError::Subscription`] when the store refuses the
    /// subscription; the engine is left `Error` with an empty mirror, and
    /// the caller may re-bind.
    pub fn bind(&mut self, scope: &ViewScope) -> Result<SubscriptionHandle, EngineError> {
        self.unbind();
        self.generation += 1;
        let path = scope.collection_path();
        debug!(%scope, %path, generation = self.generation, "binding scope");

        match self.store.subscribe(&path) {
            Ok(sub) => {
                self.subscription = Some(sub);
                self.status = SyncStatus::Subscribing;
                Ok(SubscriptionHandle {
                    generation: self.generation,
                })
            }
            Err(err) => {
                warn!(%scope, error = %err, "subscribe failed");
                self.status = SyncStatus::Error(err.to_string());
                Err(EngineError::Subscription(err.to_string()))
            }
        }
    }

    /// Tear down the current binding: cancel the subscription, clear the
    /// mirror and all pending operations.
    pub fn unbind(&mut self) {
        if self.subscription.take().is_some() || !self.mirror.is_empty() {
            debug!(generation = self.generation, "unbinding scope");
        }
        self.mirror.clear();
        self.pending.clear();
        self.status = SyncStatus::Idle;
        self.version += 1;
    }

    /// Drain and apply batches queued by the active subscription.
    ///
    /// Returns the number of batches applied. With nothing bound this is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// [`EngineError::Subscription`] when the stream has failed. The
    /// mirror is left at its last good state and the status reports the
    /// error; the engine does not auto-retry.
    pub fn pump(&mut self) -> Result<usize, EngineError> {
        let generation = self.generation;
        let batches = match self.subscription.as_mut() {
            None => return Ok(0),
            Some(sub) => match sub.poll() {
                Ok(batches) => batches,
                Err(err) => {
                    warn!(generation, error = %err, "subscription stream failed");
                    self.subscription = None;
                    self.status = SyncStatus::Error(err.to_string());
                    return Err(EngineError::Subscription(err.to_string()));
                }
            },
        };

        let mut applied = 0;
        for batch in batches {
            if self.apply_remote(generation, batch) {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Apply one inbound batch tagged with the generation it was issued
    /// under. Stale generations are discarded without touching the mirror.
    ///
    /// Returns whether the batch was applied. This is the single delivery
    /// entry point; `pump` routes through it.
    pub fn apply_remote(&mut self, generation: u64, batch: ChangeBatch) -> bool {
        if generation != self.generation {
            debug!(
                stale = generation,
                current = self.generation,
                "discarding stale-generation batch"
            );
            return false;
        }

        let (added, modified, removed) = (batch.added, batch.modified, batch.removed);
        debug!(
            generation,
            added = added.len(),
            modified = modified.len(),
            removed = removed.len(),
            "applying batch"
        );

        for item in added.into_iter().chain(modified) {
            self.upsert_from_server(item);
        }
        for id in removed {
            // A confirmed remote delete obsoletes any pending patches for
            // the id; a pending optimistic remove stays until its own
            // ack/reject resolves it.
            self.pending.retain(
                |op| !matches!(&op.kind, PendingKind::Patch { id: pid, .. } if *pid == id),
            );
            self.mirror.remove(&id);
        }

        self.version += 1;
        self.status = SyncStatus::Synced;
        true
    }

    /// Upsert a server record, replaying still-pending local patches for
    /// the same id on top so unacknowledged optimistic edits survive.
    fn upsert_from_server(&mut self, item: Item) {
        let id = item.id.clone();
        let remove_pending = self
            .pending
            .iter()
            .any(|op| matches!(&op.kind, PendingKind::Remove { id: rid, .. } if *rid == id));
        if remove_pending {
            // The newest local intent for this id is deletion; keep the
            // mirror clear until the delete resolves.
            return;
        }

        let mut merged = item;
        for op in &self.pending {
            if let PendingKind::Patch { id: pid, new, .. } = &op.kind
                && *pid == id
            {
                new.apply_to(&mut merged);
            }
        }
        self.mirror.insert(id, merged);
    }

    // -- optimistic surface (mutation coordinator only) ---------------------

    /// Insert an optimistic entry under a temporary id.
    pub(crate) fn optimistic_insert(&mut self, item: Item) {
        let temp_id = item.id.clone();
        self.mirror.insert(temp_id.clone(), item);
        let seq = self.next_seq();
        self.pending.push(PendingOp {
            seq,
            generation: self.generation,
            kind: PendingKind::Create { temp_id },
        });
        self.version += 1;
    }

    /// Swap the temporary entry for the server-confirmed one, atomically.
    pub(crate) fn ack_create(&mut self, temp_id: &str, server_item: Item) {
        self.mirror.remove(temp_id);
        self.drop_pending_create(temp_id);
        self.mirror.insert(server_item.id.clone(), server_item);
        self.version += 1;
    }

    /// Drop a rejected optimistic create.
    pub(crate) fn reject_create(&mut self, temp_id: &str) {
        self.mirror.remove(temp_id);
        self.drop_pending_create(temp_id);
        self.version += 1;
    }

    /// Apply an optimistic patch, retaining a rollback record.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] when the id is absent from the mirror.
    pub(crate) fn optimistic_patch(
        &mut self,
        id: &str,
        patch: &ItemPatch,
    ) -> Result<u64, EngineError> {
        let item = self
            .mirror
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let prior = patch.capture_prior(item);
        patch.apply_to(item);
        let seq = self.next_seq();
        self.pending.push(PendingOp {
            seq,
            generation: self.generation,
            kind: PendingKind::Patch {
                id: id.to_string(),
                new: patch.clone(),
                prior,
            },
        });
        self.version += 1;
        Ok(seq)
    }

    /// Acknowledge a patch: the write landed, the confirming batch will
    /// carry the authoritative value.
    pub(crate) fn ack_patch(&mut self, seq: u64) {
        self.pending.retain(|op| op.seq != seq);
    }

    /// Roll back a rejected patch: restore the fields it touched, except
    /// those a newer pending patch has since claimed.
    pub(crate) fn reject_patch(&mut self, seq: u64) {
        let Some(pos) = self
            .pending
            .iter()
            .position(|op| op.seq == seq && matches!(op.kind, PendingKind::Patch { .. }))
        else {
            return;
        };
        let op = self.pending.remove(pos);
        let generation = op.generation;
        let PendingKind::Patch { id, prior, .. } = op.kind else {
            return;
        };

        let Some(item) = self.mirror.get_mut(&id) else {
            return;
        };
        let mut restore = prior.touched();
        for later in &self.pending {
            if let PendingKind::Patch {
                id: pid, new: later_new, ..
            } = &later.kind
                && *pid == id
                && later.seq > seq
            {
                for field in later_new.touched() {
                    restore.remove(&field);
                }
            }
        }
        debug!(
            %id,
            seq,
            generation,
            fields = restore.len(),
            "rolling back rejected patch"
        );
        prior.restrict(&restore).apply_to(item);
        self.version += 1;
    }

    /// Optimistically delete, retaining the entry in the undo buffer.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] when the id is absent from the mirror.
    pub(crate) fn optimistic_remove(&mut self, id: &str) -> Result<(), EngineError> {
        let prior = self
            .mirror
            .remove(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let seq = self.next_seq();
        self.pending.push(PendingOp {
            seq,
            generation: self.generation,
            kind: PendingKind::Remove {
                id: id.to_string(),
                prior,
            },
        });
        self.version += 1;
        Ok(())
    }

    /// Acknowledge a delete: drop the undo entry.
    pub(crate) fn ack_remove(&mut self, id: &str) {
        self.pending
            .retain(|op| !matches!(&op.kind, PendingKind::Remove { id: rid, .. } if rid == id));
    }

    /// Roll back a rejected delete: restore the retained entry.
    pub(crate) fn reject_remove(&mut self, id: &str) {
        let Some(pos) = self
            .pending
            .iter()
            .position(|op| matches!(&op.kind, PendingKind::Remove { id: rid, .. } if rid == id))
        else {
            return;
        };
        let op = self.pending.remove(pos);
        if let PendingKind::Remove { id, prior } = op.kind {
            debug!(%id, seq = op.seq, "restoring rejected delete");
            self.mirror.insert(id, prior);
            self.version += 1;
        }
    }

    fn drop_pending_create(&mut self, temp_id: &str) {
        self.pending
            .retain(|op| !matches!(&op.kind, PendingKind::Create { temp_id: tid } if tid == temp_id));
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    // -- mirror snapshot ----------------------------------------------------

    /// Items in id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.mirror.values()
    }

    /// One item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.mirror.get(id)
    }

    /// Number of mirrored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mirror.len()
    }

    /// Whether the mirror is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mirror.is_empty()
    }

    /// Monotonic mirror version; increments on every mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The current subscription generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &SyncStatus {
        &self.status
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("generation", &self.generation)
            .field("version", &self.version)
            .field("status", &self.status)
            .field("items", &self.mirror.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
