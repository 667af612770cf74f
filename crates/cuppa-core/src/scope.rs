//! View scopes and collection path derivation.
//!
//! A [`ViewScope`] is pure data describing which logical collection is
//! bound: one user's private list, or the single shared list. Scopes are
//! immutable; switching views constructs a new scope and tears down the
//! old subscription.
//!
//! Collection paths derive deterministically from the scope:
//!
//! ```text
//! Private("u1")  ->  users/u1/places
//! Shared         ->  shared/places
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which logical collection the mirror tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "view", content = "owner")]
pub enum ViewScope {
    /// Items created by exactly one identity, visible only to it.
    Private(String),
    /// One collection visible to everyone, creatable by any authenticated
    /// identity, mutable per-item by its owner or the curator.
    Shared,
}

/// A scope-derived collection path understood by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl ViewScope {
    /// The remote collection path for this scope.
    #[must_use]
    pub fn collection_path(&self) -> CollectionPath {
        match self {
            Self::Private(owner) => CollectionPath(format!("users/{owner}/places")),
            Self::Shared => CollectionPath("shared/places".to_string()),
        }
    }

    /// Whether this is the shared, multi-writer scope.
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }
}

impl fmt::Display for ViewScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private(owner) => write!(f, "private({owner})"),
            Self::Shared => write!(f, "shared"),
        }
    }
}

impl CollectionPath {
    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
