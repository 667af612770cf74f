//! Capability decisions for items reachable through a bound scope.
//!
//! The gate is a pure function of `(Session, ViewScope, Item)`: it holds
//! no mutable state and performs no I/O, so callers recompute it on every
//! render of controls. The curator identity — the one account allowed to
//! mutate any item in the shared scope — is supplied at construction.
//!
//! Scope *reachability* (who may bind a scope at all) is decided at the
//! bind layer, not here: by the time an item is visible through a bound
//! scope, `view` is always granted.

use crate::model::item::Item;
use crate::scope::ViewScope;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What the current session may do with one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Item is visible. Always `true` through a bound scope.
    pub view: bool,
    /// Session may modify the item's fields.
    pub edit: bool,
    /// Session may delete the item.
    pub delete: bool,
}

impl Capabilities {
    const VIEW_ONLY: Self = Self {
        view: true,
        edit: false,
        delete: false,
    };

    const FULL: Self = Self {
        view: true,
        edit: true,
        delete: true,
    };
}

/// Status of a single capability for user-visible display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityStatus {
    /// Short machine-readable name of the capability.
    pub name: &'static str,
    /// Whether the capability is currently granted.
    pub granted: bool,
    /// What the UI does when the capability is missing.
    pub fallback: &'static str,
}

// ---------------------------------------------------------------------------
// PermissionGate
// ---------------------------------------------------------------------------

/// Pure capability decisions, parameterized only by the curator identity.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    curator: Option<String>,
}

impl PermissionGate {
    /// A gate with an optional curator identity for the shared scope.
    #[must_use]
    pub const fn new(curator: Option<String>) -> Self {
        Self { curator }
    }

    /// The configured curator identity, if any.
    #[must_use]
    pub fn curator(&self) -> Option<&str> {
        self.curator.as_deref()
    }

    /// Decide what `session` may do with `item` under `scope`.
    ///
    /// Rules:
    /// - `Private(owner)`: edit/delete iff `session.id == owner`.
    /// - `Shared`: edit/delete iff the session is not anonymous and is the
    ///   item's owner or the curator. Anonymous sessions view only.
    #[must_use]
    pub fn capabilities_for(
        &self,
        session: &Session,
        scope: &ViewScope,
        item: &Item,
    ) -> Capabilities {
        match scope {
            ViewScope::Private(owner) => {
                if session.id == *owner {
                    Capabilities::FULL
                } else {
                    Capabilities::VIEW_ONLY
                }
            }
            ViewScope::Shared => {
                if session.is_anonymous {
                    return Capabilities::VIEW_ONLY;
                }
                let is_owner = session.id == item.owner_id;
                let is_curator = self.curator.as_deref() == Some(session.id.as_str());
                if is_owner || is_curator {
                    Capabilities::FULL
                } else {
                    Capabilities::VIEW_ONLY
                }
            }
        }
    }

    /// Whether `session` may create items under `scope`.
    ///
    /// Private scope creation requires owning the scope; shared scope
    /// creation requires any authenticated identity.
    #[must_use]
    pub fn can_create(&self, session: &Session, scope: &ViewScope) -> bool {
        match scope {
            ViewScope::Private(owner) => session.id == *owner,
            ViewScope::Shared => !session.is_anonymous,
        }
    }
}

/// Describe a capability set for display surfaces, in a stable order.
#[must_use]
pub fn describe_capabilities(caps: Capabilities) -> Vec<CapabilityStatus> {
    vec![
        CapabilityStatus {
            name: "view",
            granted: caps.view,
            fallback: "item is hidden from the list and map",
        },
        CapabilityStatus {
            name: "edit",
            granted: caps.edit,
            fallback: "edit and quick-edit controls are not rendered",
        },
        CapabilityStatus {
            name: "delete",
            granted: caps.delete,
            fallback: "delete control is not rendered",
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::model::item::{PriceLevel, Rating};

    fn item_owned_by(owner: &str) -> Item {
        Item {
            id: "srv-1".into(),
            name: "Steam Espresso Bar".into(),
            address: None,
            external_place_ref: None,
            rating: Rating::from_value(4.0).expect("valid"),
            price_level: PriceLevel::new(2).expect("valid"),
            category: None,
            tags: BTreeSet::new(),
            notes: String::new(),
            supports_cold_brew: false,
            coordinates: None,
            owner_id: owner.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // === Private scope ===

    #[test]
    fn private_owner_gets_full_capabilities() {
        let gate = PermissionGate::default();
        let caps = gate.capabilities_for(
            &Session::authenticated("u1"),
            &ViewScope::Private("u1".into()),
            &item_owned_by("u1"),
        );
        assert_eq!(caps, Capabilities::FULL);
    }

    #[test]
    fn private_non_owner_views_only() {
        // Reachability for foreign private scopes is denied at bind; the
        // item-layer rule still degrades to view-only.
        let gate = PermissionGate::default();
        let caps = gate.capabilities_for(
            &Session::authenticated("u2"),
            &ViewScope::Private("u1".into()),
            &item_owned_by("u1"),
        );
        assert!(caps.view);
        assert!(!caps.edit);
        assert!(!caps.delete);
    }

    // === Shared scope ===

    #[test]
    fn shared_owner_mutates_own_items() {
        let gate = PermissionGate::default();
        let caps = gate.capabilities_for(
            &Session::authenticated("u1"),
            &ViewScope::Shared,
            &item_owned_by("u1"),
        );
        assert_eq!(caps, Capabilities::FULL);
    }

    #[test]
    fn shared_non_owner_views_only() {
        let gate = PermissionGate::default();
        let caps = gate.capabilities_for(
            &Session::authenticated("u2"),
            &ViewScope::Shared,
            &item_owned_by("u1"),
        );
        assert_eq!(caps, Capabilities::VIEW_ONLY);
    }

    #[test]
    fn shared_curator_mutates_any_item() {
        let gate = PermissionGate::new(Some("curator-1".into()));
        let caps = gate.capabilities_for(
            &Session::authenticated("curator-1"),
            &ViewScope::Shared,
            &item_owned_by("u1"),
        );
        assert_eq!(caps, Capabilities::FULL);
    }

    #[test]
    fn shared_anonymous_never_mutates() {
        // Even an anonymous session whose id happens to match the owner.
        let gate = PermissionGate::new(Some("guest-1".into()));
        let caps = gate.capabilities_for(
            &Session::anonymous("guest-1"),
            &ViewScope::Shared,
            &item_owned_by("guest-1"),
        );
        assert_eq!(caps, Capabilities::VIEW_ONLY);
    }

    // === Creation ===

    #[test]
    fn create_rules() {
        let gate = PermissionGate::default();
        let u1 = Session::authenticated("u1");
        let guest = Session::anonymous("guest-1");

        assert!(gate.can_create(&u1, &ViewScope::Private("u1".into())));
        assert!(!gate.can_create(&u1, &ViewScope::Private("u2".into())));
        assert!(gate.can_create(&u1, &ViewScope::Shared));
        assert!(!gate.can_create(&guest, &ViewScope::Shared));
    }

    // === Purity ===

    #[test]
    fn gate_is_pure() {
        let gate = PermissionGate::new(Some("curator-1".into()));
        let session = Session::authenticated("u2");
        let scope = ViewScope::Shared;
        let item = item_owned_by("u1");
        let first = gate.capabilities_for(&session, &scope, &item);
        for _ in 0..3 {
            assert_eq!(gate.capabilities_for(&session, &scope, &item), first);
        }
    }

    // === describe_capabilities ===

    #[test]
    fn describe_names_are_stable() {
        let statuses = describe_capabilities(Capabilities::VIEW_ONLY);
        let names: Vec<_> = statuses.iter().map(|s| s.name).collect();
        assert_eq!(names, ["view", "edit", "delete"]);
        assert!(statuses[0].granted);
        assert!(!statuses[1].granted);
    }
}
