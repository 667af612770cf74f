//! Place-search collaborator interface.
//!
//! The engine consumes exactly one selected candidate per create/edit
//! session and copies its fields into the draft
//! ([`crate::model::ItemDraft::apply_candidate`]). How candidates are
//! produced — autocomplete widget, geocoder, static fixture — is the
//! collaborator's business.

use serde::{Deserialize, Serialize};

use crate::model::item::Coordinates;

/// One place-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    /// Canonical place name.
    pub name: String,
    /// Formatted address, when the search backend knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Opaque token correlating this candidate to the search backend.
    pub external_place_ref: String,
    /// Geographic position, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Place-search collaborator: free text in, candidates out.
pub trait PlaceSearch {
    /// Search for places matching `query`, best match first.
    fn search(&self, query: &str) -> Vec<PlaceCandidate>;
}

/// A canned candidate list, for hosts without a search backend and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaceSearch {
    candidates: Vec<PlaceCandidate>,
}

impl StaticPlaceSearch {
    /// A search over a fixed candidate set.
    #[must_use]
    pub const fn new(candidates: Vec<PlaceCandidate>) -> Self {
        Self { candidates }
    }
}

impl PlaceSearch for StaticPlaceSearch {
    fn search(&self, query: &str) -> Vec<PlaceCandidate> {
        let needle = query.to_lowercase();
        self.candidates
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}
