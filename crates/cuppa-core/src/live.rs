//! The engine facade.
//!
//! [`LiveView`] is the explicitly constructed, passed-down engine
//! instance: it owns the sync engine, the mutation coordinator, the
//! memoizing projector, and the marker reconciler, and takes its
//! collaborators — remote store, identity provider, permission gate — as
//! constructor dependencies. No ambient singletons.
//!
//! Hosts drive it in a simple loop: `bind` a scope, `pump` deliveries,
//! `project` for the table, `reconcile_markers` for the map, and issue
//! mutations. Scope reachability is enforced here at the bind layer:
//! a session can only bind its own private scope.

use std::rc::Rc;

use tracing::debug;

use crate::error::EngineError;
use crate::markers::{MapSurface, MarkerReconciler};
use crate::model::draft::{ItemDraft, ItemPatch};
use crate::model::item::Item;
use crate::mutate::{MutationCoordinator, QuickEdit};
use crate::permissions::{Capabilities, PermissionGate};
use crate::project::{ProjectionSpec, Projector};
use crate::scope::ViewScope;
use crate::session::{IdentityProvider, Session};
use crate::store::RemoteStore;
use crate::sync::{SubscriptionHandle, SyncEngine, SyncStatus};

/// One live, permission-scoped view over a remote collection.
pub struct LiveView {
    store: Rc<dyn RemoteStore>,
    identity: Rc<dyn IdentityProvider>,
    gate: PermissionGate,
    sync: SyncEngine,
    coordinator: MutationCoordinator,
    projector: Projector,
    markers: MarkerReconciler,
    scope: Option<ViewScope>,
    session: Option<Session>,
    seen_session_version: u64,
}

impl LiveView {
    /// Wire an engine from its collaborators. Nothing is bound yet.
    pub fn new(
        store: Rc<dyn RemoteStore>,
        identity: Rc<dyn IdentityProvider>,
        gate: PermissionGate,
    ) -> Self {
        let session = identity.current();
        let seen_session_version = identity.session_version();
        let sync = SyncEngine::new(Rc::clone(&store));
        Self {
            store,
            identity,
            gate,
            sync,
            coordinator: MutationCoordinator::new(),
            projector: Projector::new(),
            markers: MarkerReconciler::new(),
            scope: None,
            session,
            seen_session_version,
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Bind `scope`, tearing down any previous binding.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PermissionDenied`] when there is no session, or
    ///   when `scope` is another identity's private scope — the scope is
    ///   unreachable and the current binding is left untouched.
    /// - [`EngineError::Subscription`] when the store refuses the
    ///   subscription.
    pub fn bind(&mut self, scope: ViewScope) -> Result<SubscriptionHandle, EngineError> {
        self.refresh_session();
        let Some(session) = self.session.clone() else {
            return Err(EngineError::PermissionDenied(
                "no session: sign in before binding a view".into(),
            ));
        };
        if let ViewScope::Private(owner) = &scope
            && *owner != session.id
        {
            return Err(EngineError::PermissionDenied(format!(
                "{} cannot bind {scope}",
                session.id
            )));
        }

        self.markers.reset();
        self.projector.invalidate();
        match self.sync.bind(&scope) {
            Ok(handle) => {
                debug!(%scope, generation = handle.generation(), "view bound");
                self.scope = Some(scope);
                Ok(handle)
            }
            Err(err) => {
                self.scope = None;
                Err(err)
            }
        }
    }

    /// Tear down the current binding; the mirror is destroyed.
    pub fn unbind(&mut self) {
        self.sync.unbind();
        self.scope = None;
        self.markers.reset();
        self.projector.invalidate();
    }

    /// Full teardown: unbind and remove all markers from `surface`.
    pub fn teardown(&mut self, surface: &mut dyn MapSurface) {
        self.unbind();
        self.markers.clear(surface);
    }

    /// Drain pending deliveries onto the mirror.
    ///
    /// Observes identity transitions first: losing or switching the
    /// session tears the bound view down (and returns 0).
    ///
    /// # Errors
    ///
    /// [`EngineError::Subscription`] when the inbound stream failed.
    pub fn pump(&mut self) -> Result<usize, EngineError> {
        self.refresh_session();
        if self.scope.is_none() {
            return Ok(0);
        }
        self.sync.pump()
    }

    fn refresh_session(&mut self) {
        let version = self.identity.session_version();
        if version == self.seen_session_version {
            return;
        }
        self.seen_session_version = version;
        let current = self.identity.current();
        if current != self.session {
            debug!("session changed; tearing down the bound view");
            self.session = current;
            self.unbind();
        }
    }

    // -- projections --------------------------------------------------------

    /// The visible items under `spec`, memoized on the mirror version.
    pub fn project(&mut self, spec: &ProjectionSpec) -> &[Item] {
        self.projector.project(&self.sync, spec)
    }

    /// Reconcile the map surface against the projection under `spec`.
    pub fn reconcile_markers(&mut self, spec: &ProjectionSpec, surface: &mut dyn MapSurface) {
        let visible = self.projector.project(&self.sync, spec);
        self.markers.reconcile(visible, surface);
    }

    /// What the current session may do with the mirrored item `id`.
    #[must_use]
    pub fn capabilities(&self, id: &str) -> Option<Capabilities> {
        let session = self.session.as_ref()?;
        let scope = self.scope.as_ref()?;
        let item = self.sync.get(id)?;
        Some(self.gate.capabilities_for(session, scope, item))
    }

    // -- mutations ----------------------------------------------------------

    /// Create an item in the bound scope.
    ///
    /// # Errors
    ///
    /// See [`MutationCoordinator::create`]; additionally
    /// [`EngineError::Validation`] when no view is bound.
    pub fn create(&mut self, draft: &ItemDraft) -> Result<Item, EngineError> {
        let (session, scope) = self.bound()?;
        self.coordinator
            .create(&mut self.sync, &*self.store, &self.gate, &session, &scope, draft)
    }

    /// Apply a field-granular update to `id`.
    ///
    /// # Errors
    ///
    /// See [`MutationCoordinator::update`]; additionally
    /// [`EngineError::Validation`] when no view is bound.
    pub fn update(&mut self, id: &str, patch: &ItemPatch) -> Result<(), EngineError> {
        let (session, scope) = self.bound()?;
        self.coordinator.update(
            &mut self.sync,
            &*self.store,
            &self.gate,
            &session,
            &scope,
            id,
            patch,
        )
    }

    /// Single-field quick edit of `id`.
    ///
    /// # Errors
    ///
    /// See [`MutationCoordinator::quick_update`]; additionally
    /// [`EngineError::Validation`] when no view is bound.
    pub fn quick_update(&mut self, id: &str, edit: QuickEdit) -> Result<(), EngineError> {
        let (session, scope) = self.bound()?;
        self.coordinator.quick_update(
            &mut self.sync,
            &*self.store,
            &self.gate,
            &session,
            &scope,
            id,
            edit,
        )
    }

    /// Delete `id` from the bound scope.
    ///
    /// # Errors
    ///
    /// See [`MutationCoordinator::remove`]; additionally
    /// [`EngineError::Validation`] when no view is bound.
    pub fn remove(&mut self, id: &str) -> Result<(), EngineError> {
        let (session, scope) = self.bound()?;
        self.coordinator
            .remove(&mut self.sync, &*self.store, &self.gate, &session, &scope, id)
    }

    fn bound(&mut self) -> Result<(Session, ViewScope), EngineError> {
        self.refresh_session();
        let session = self.session.clone().ok_or_else(|| {
            EngineError::PermissionDenied("no session: sign in before mutating".into())
        })?;
        let scope = self
            .scope
            .clone()
            .ok_or_else(|| EngineError::Validation("no view is bound — bind a scope first".into()))?;
        Ok((session, scope))
    }

    // -- snapshot -----------------------------------------------------------

    /// Current subscription status.
    #[must_use]
    pub const fn status(&self) -> &SyncStatus {
        self.sync.status()
    }

    /// Mirror version; increments on every mirror mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.sync.version()
    }

    /// Items in id order, unprojected.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sync.items()
    }

    /// One mirrored item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.sync.get(id)
    }

    /// The bound scope, if any.
    #[must_use]
    pub const fn scope(&self) -> Option<&ViewScope> {
        self.scope.as_ref()
    }

    /// The observed session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The permission gate, for rendering controls.
    #[must_use]
    pub const fn gate(&self) -> &PermissionGate {
        &self.gate
    }
}

impl std::fmt::Debug for LiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveView")
            .field("scope", &self.scope)
            .field("session", &self.session)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::session::FixedIdentity;
    use crate::store::MemoryStore;

    fn view_for(store: &MemoryStore, user: &str) -> LiveView {
        LiveView::new(
            Rc::new(store.clone()),
            FixedIdentity::handle(Session::authenticated(user)),
            PermissionGate::default(),
        )
    }

    // === bind-layer scope reachability ===

    #[test]
    fn foreign_private_scope_cannot_be_bound() {
        let store = MemoryStore::new();
        let mut view = view_for(&store, "u2");
        let err = view
            .bind(ViewScope::Private("u1".into()))
            .expect_err("unreachable scope");
        assert!(matches!(err, EngineError::PermissionDenied(_)));
        assert!(view.scope().is_none());
    }

    #[test]
    fn own_private_scope_binds() {
        let store = MemoryStore::new();
        let mut view = view_for(&store, "u1");
        view.bind(ViewScope::Private("u1".into())).expect("bind");
        view.pump().expect("pump");
        assert_eq!(*view.status(), SyncStatus::Synced);
    }

    #[test]
    fn failed_foreign_bind_leaves_current_binding_alone() {
        let store = MemoryStore::new();
        let mut view = view_for(&store, "u1");
        view.bind(ViewScope::Shared).expect("bind");
        view.pump().expect("pump");

        let err = view
            .bind(ViewScope::Private("u2".into()))
            .expect_err("unreachable");
        assert!(matches!(err, EngineError::PermissionDenied(_)));
        assert_eq!(view.scope(), Some(&ViewScope::Shared));
        assert_eq!(*view.status(), SyncStatus::Synced);
    }

    #[test]
    fn anonymous_session_can_bind_shared() {
        let store = MemoryStore::new();
        let mut view = LiveView::new(
            Rc::new(store.clone()),
            FixedIdentity::handle(Session::anonymous("guest-1")),
            PermissionGate::default(),
        );
        view.bind(ViewScope::Shared).expect("bind");
        view.pump().expect("pump");
        assert_eq!(*view.status(), SyncStatus::Synced);
    }

    // === end-to-end through the facade ===

    #[test]
    fn create_project_and_capabilities() {
        let store = MemoryStore::new();
        let mut view = view_for(&store, "u1");
        view.bind(ViewScope::Shared).expect("bind");
        view.pump().expect("pump");

        let created = view.create(&ItemDraft::new("Crema")).expect("create");
        let visible = view.project(&ProjectionSpec::default());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, created.id);

        let caps = view.capabilities(&created.id).expect("present");
        assert!(caps.edit && caps.delete);
    }

    #[test]
    fn mutation_without_binding_is_rejected() {
        let store = MemoryStore::new();
        let mut view = view_for(&store, "u1");
        let err = view.create(&ItemDraft::new("Crema")).expect_err("unbound");
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn projection_is_memoized_until_version_changes() {
        let store = MemoryStore::new();
        let mut view = view_for(&store, "u1");
        view.bind(ViewScope::Shared).expect("bind");
        view.pump().expect("pump");
        view.create(&ItemDraft::new("Crema")).expect("create");

        let spec = ProjectionSpec::default();
        let first = view.project(&spec).to_vec();
        let second = view.project(&spec).to_vec();
        assert_eq!(first, second);

        view.quick_update(&first[0].id, QuickEdit::ColdBrew(true))
            .expect("quick edit");
        let third = view.project(&spec);
        assert!(third[0].supports_cold_brew, "recomputed after mutation");
    }

    // === session transitions ===

    /// Identity provider whose session can be swapped mid-test.
    #[derive(Debug, Default)]
    struct SwitchableIdentity {
        state: RefCell<(Option<Session>, u64)>,
    }

    impl SwitchableIdentity {
        fn set(&self, session: Option<Session>) {
            let mut state = self.state.borrow_mut();
            state.0 = session;
            state.1 += 1;
        }
    }

    impl IdentityProvider for SwitchableIdentity {
        fn current(&self) -> Option<Session> {
            self.state.borrow().0.clone()
        }
        fn session_version(&self) -> u64 {
            self.state.borrow().1
        }
    }

    #[test]
    fn losing_the_session_destroys_the_mirror() {
        let store = MemoryStore::new();
        let identity = Rc::new(SwitchableIdentity::default());
        identity.set(Some(Session::authenticated("u1")));
        let mut view = LiveView::new(
            Rc::new(store.clone()),
            Rc::<SwitchableIdentity>::clone(&identity),
            PermissionGate::default(),
        );
        view.bind(ViewScope::Shared).expect("bind");
        view.pump().expect("pump");
        view.create(&ItemDraft::new("Crema")).expect("create");
        assert_eq!(view.items().count(), 1);

        identity.set(None);
        assert_eq!(view.pump().expect("pump"), 0);
        assert!(view.scope().is_none());
        assert_eq!(view.items().count(), 0, "mirror destroyed on sign-out");
        assert_eq!(*view.status(), SyncStatus::Idle);
    }

    #[test]
    fn switching_identity_tears_down_the_old_binding() {
        let store = MemoryStore::new();
        let identity = Rc::new(SwitchableIdentity::default());
        identity.set(Some(Session::authenticated("u1")));
        let mut view = LiveView::new(
            Rc::new(store.clone()),
            Rc::<SwitchableIdentity>::clone(&identity),
            PermissionGate::default(),
        );
        view.bind(ViewScope::Private("u1".into())).expect("bind");
        view.pump().expect("pump");

        identity.set(Some(Session::authenticated("u2")));
        view.pump().expect("pump");
        assert!(view.scope().is_none(), "u1's private view is gone");
        // u2 can bind their own scope afterwards.
        view.bind(ViewScope::Private("u2".into())).expect("bind");
    }
}
