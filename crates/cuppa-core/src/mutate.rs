//! Optimistic mutations and their reconciliation.
//!
//! Every mutation follows the same protocol:
//!
//! 1. validate locally — bad input never reaches the store;
//! 2. re-check the permission gate — a denied operation has no side
//!    effect at all;
//! 3. apply the optimistic mirror write through the sync engine's
//!    exclusive path, so the projection reflects the change immediately;
//! 4. issue the remote write;
//! 5. on rejection, roll the mirror back; on confirmation, let the next
//!    inbound batch carry the authoritative value.
//!
//! Creates run under a locally generated temporary id (`tmp-N`) that is
//! swapped for the server id atomically on confirmation, so the projector
//! never sees a duplicate or an orphaned temporary entry.

use chrono::Utc;
use tracing::debug;

use crate::error::EngineError;
use crate::model::draft::{ItemDraft, ItemPatch};
use crate::model::item::{Item, PriceLevel, Rating};
use crate::permissions::PermissionGate;
use crate::scope::ViewScope;
use crate::session::Session;
use crate::store::{RemoteStore, StoreError};
use crate::sync::SyncEngine;

// ---------------------------------------------------------------------------
// QuickEdit
// ---------------------------------------------------------------------------

/// A single-field in-place edit, issued without opening the full form.
///
/// Raw values are validated here, at the write boundary: an off-grid
/// rating or out-of-range price level is rejected locally and never sent
/// to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuickEdit {
    /// Set the rating; must be on the half-point grid in `[0, 5]`.
    Rating(f64),
    /// Set the price level; must be in `[1, 4]`.
    PriceLevel(u8),
    /// Toggle the cold brew flag.
    ColdBrew(bool),
}

impl QuickEdit {
    /// Validate and convert into a one-field patch.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for out-of-range values.
    pub fn into_patch(self) -> Result<ItemPatch, EngineError> {
        let mut patch = ItemPatch::empty();
        match self {
            Self::Rating(value) => patch.rating = Some(Rating::from_value(value)?),
            Self::PriceLevel(level) => patch.price_level = Some(PriceLevel::new(level)?),
            Self::ColdBrew(flag) => patch.supports_cold_brew = Some(flag),
        }
        Ok(patch)
    }
}

// ---------------------------------------------------------------------------
// MutationCoordinator
// ---------------------------------------------------------------------------

/// Drives optimistic writes against one sync engine and store.
///
/// Holds only the temporary-id counter; all mirror state lives in the
/// [`SyncEngine`], keeping a single source of truth.
#[derive(Debug, Default)]
pub struct MutationCoordinator {
    next_temp: u64,
}

impl MutationCoordinator {
    /// A coordinator that has issued no temporary ids yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_temp: 0 }
    }

    fn next_temp_id(&mut self) -> String {
        self.next_temp += 1;
        format!("tmp-{}", self.next_temp)
    }

    /// Create an item from `draft` under `scope`.
    ///
    /// Returns the server-confirmed item (permanent id, server
    /// timestamps).
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] for an unsaveable draft.
    /// - [`EngineError::PermissionDenied`] when `session` may not create
    ///   under `scope`; nothing is written anywhere.
    /// - [`EngineError::RemoteRejected`] when the store refuses; the
    ///   temporary entry is removed.
    pub fn create(
        &mut self,
        sync: &mut SyncEngine,
        store: &dyn RemoteStore,
        gate: &PermissionGate,
        session: &Session,
        scope: &ViewScope,
        draft: &ItemDraft,
    ) -> Result<Item, EngineError> {
        draft.validate()?;
        if !gate.can_create(session, scope) {
            return Err(EngineError::PermissionDenied(format!(
                "{} may not create items in {scope}",
                session.id
            )));
        }

        let temp_id = self.next_temp_id();
        let now = Utc::now();
        let optimistic = Item {
            id: temp_id.clone(),
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
            owner_id: session.id.clone(),
            // Local stamps are placeholders; the server's win on swap.
            created_at: now,
            updated_at: now,
        };
        sync.optimistic_insert(optimistic);
        debug!(%scope, %temp_id, "optimistic create");

        match store.create(&scope.collection_path(), &session.id, draft) {
            Ok(server_item) => {
                debug!(%temp_id, id = %server_item.id, "create confirmed");
                sync.ack_create(&temp_id, server_item.clone());
                Ok(server_item)
            }
            Err(err) => {
                sync.reject_create(&temp_id);
                Err(remote_error(err))
            }
        }
    }

    /// Apply a field-granular update to an existing item.
    ///
    /// An empty patch is a no-op and succeeds without touching anything.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] when the id is absent from the mirror
    ///   (benign: the item vanished under the user).
    /// - [`EngineError::PermissionDenied`] without the `edit` capability.
    /// - [`EngineError::RemoteRejected`] when the store refuses; the
    ///   mirror entry is rolled back to its pre-patch value.
    pub fn update(
        &mut self,
        sync: &mut SyncEngine,
        store: &dyn RemoteStore,
        gate: &PermissionGate,
        session: &Session,
        scope: &ViewScope,
        id: &str,
        patch: &ItemPatch,
    ) -> Result<(), EngineError> {
        if patch.is_empty() {
            return Ok(());
        }
        let item = sync
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if !gate.capabilities_for(session, scope, item).edit {
            return Err(EngineError::PermissionDenied(format!(
                "{} may not edit {id}",
                session.id
            )));
        }

        let seq = sync.optimistic_patch(id, patch)?;
        debug!(%scope, id, seq, "optimistic update");

        match store.patch(&scope.collection_path(), id, patch) {
            Ok(()) => {
                sync.ack_patch(seq);
                Ok(())
            }
            Err(err) => {
                sync.reject_patch(seq);
                Err(remote_error(err))
            }
        }
    }

    /// Single-field variant of [`update`](Self::update) for in-place
    /// rating/price edits. Validation happens before the permission check
    /// or any write.
    ///
    /// # Errors
    ///
    /// As [`update`](Self::update), plus [`EngineError::Validation`] for
    /// out-of-range values.
    pub fn quick_update(
        &mut self,
        sync: &mut SyncEngine,
        store: &dyn RemoteStore,
        gate: &PermissionGate,
        session: &Session,
        scope: &ViewScope,
        id: &str,
        edit: QuickEdit,
    ) -> Result<(), EngineError> {
        let patch = edit.into_patch()?;
        self.update(sync, store, gate, session, scope, id, &patch)
    }

    /// Delete an item, optimistically and with undo on rejection.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] when the id is absent from the mirror.
    /// - [`EngineError::PermissionDenied`] without the `delete`
    ///   capability.
    /// - [`EngineError::RemoteRejected`] when the store refuses; the
    ///   entry is restored from the undo buffer.
    pub fn remove(
        &mut self,
        sync: &mut SyncEngine,
        store: &dyn RemoteStore,
        gate: &PermissionGate,
        session: &Session,
        scope: &ViewScope,
        id: &str,
    ) -> Result<(), EngineError> {
        let item = sync
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if !gate.capabilities_for(session, scope, item).delete {
            return Err(EngineError::PermissionDenied(format!(
                "{} may not delete {id}",
                session.id
            )));
        }

        sync.optimistic_remove(id)?;
        debug!(%scope, id, "optimistic delete");

        match store.delete(&scope.collection_path(), id) {
            Ok(()) => {
                sync.ack_remove(id);
                Ok(())
            }
            Err(err) => {
                sync.reject_remove(id);
                Err(remote_error(err))
            }
        }
    }
}

/// Map a store failure onto the engine taxonomy.
fn remote_error(err: StoreError) -> EngineError {
    match err {
        StoreError::NotFound(id) => EngineError::NotFound(id),
        other => EngineError::RemoteRejected(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
