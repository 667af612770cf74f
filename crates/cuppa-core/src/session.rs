//! Sessions and the identity collaborator.
//!
//! The engine never drives sign-in or sign-out. It observes the current
//! [`Session`] through an [`IdentityProvider`] and reacts to changes by
//! tearing down state that belonged to the old identity.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// The current identity: an opaque id plus a strength flag.
///
/// Anonymous sessions can view the shared scope but never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identity, compared against `Item::owner_id` and scope owners.
    pub id: String,
    /// `true` for anonymous (unverified) identities.
    pub is_anonymous: bool,
}

impl Session {
    /// An authenticated session for `id`.
    #[must_use]
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_anonymous: false,
        }
    }

    /// An anonymous session for `id`.
    #[must_use]
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_anonymous: true,
        }
    }
}

/// Identity collaborator: supplies the current session and a change signal.
///
/// `session_version` increments on every identity transition; the host
/// compares versions to detect sign-in/out without a callback registry.
/// `None` from `current` means no session at all (signed out) — the engine
/// treats that as loss of the bound view.
pub trait IdentityProvider {
    /// The current session, or `None` when signed out.
    fn current(&self) -> Option<Session>;

    /// Monotonic counter incremented on every identity transition.
    fn session_version(&self) -> u64;
}

/// A fixed identity, for hosts where sign-in happens before the engine is
/// constructed (and for tests).
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    session: Option<Session>,
}

impl FixedIdentity {
    /// Provider that always reports `session`.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Provider that always reports signed-out.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self { session: None }
    }

    /// Convenience: boxed as a collaborator handle.
    #[must_use]
    pub fn handle(session: Session) -> Rc<dyn IdentityProvider> {
        Rc::new(Self::new(session))
    }
}

impl IdentityProvider for FixedIdentity {
    fn current(&self) -> Option<Session> {
        self.session.clone()
    }

    fn session_version(&self) -> u64 {
        0
    }
}
