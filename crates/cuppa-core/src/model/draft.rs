//! Create drafts and field-granular patches.
//!
//! `ItemDraft` is the create-form payload: everything a user supplies,
//! nothing the store assigns (`id`, `owner_id`, timestamps). `ItemPatch`
//! is a partial update where every settable field is optional; patches
//! report their touched-field set, which the sync engine's supersede rule
//! operates on, and can capture prior values for rollback.

use std::collections::BTreeSet;

use crate::model::item::{Category, Coordinates, Item, PriceLevel, Rating};
use crate::places::PlaceCandidate;

// ---------------------------------------------------------------------------
// ItemDraft
// ---------------------------------------------------------------------------

/// The payload of a create operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub address: Option<String>,
    pub external_place_ref: Option<String>,
    pub rating: Rating,
    pub price_level: PriceLevel,
    pub category: Option<Category>,
    pub tags: BTreeSet<String>,
    pub notes: String,
    pub supports_cold_brew: bool,
    pub coordinates: Option<Coordinates>,
}

/// A draft that cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDraft {
    /// The name is empty or whitespace-only.
    #[error("a shop needs a non-blank name")]
    BlankName,
}

impl ItemDraft {
    /// Start a draft with the given name and neutral defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            external_place_ref: None,
            rating: Rating::MIN,
            price_level: PriceLevel::MIN,
            category: None,
            tags: BTreeSet::new(),
            notes: String::new(),
            supports_cold_brew: false,
            coordinates: None,
        }
    }

    /// Check save preconditions.
    ///
    /// # Errors
    ///
    /// [`InvalidDraft::BlankName`] when the name is empty after trimming.
    pub fn validate(&self) -> Result<(), InvalidDraft> {
        if self.name.trim().is_empty() {
            return Err(InvalidDraft::BlankName);
        }
        Ok(())
    }

    /// Copy one selected place-search candidate into the draft.
    ///
    /// Overwrites name, address, place ref, and coordinates; leaves the
    /// user-authored fields (rating, notes, tags, ...) alone.
    pub fn apply_candidate(&mut self, candidate: &PlaceCandidate) {
        self.name.clone_from(&candidate.name);
        self.address.clone_from(&candidate.address);
        self.external_place_ref = Some(candidate.external_place_ref.clone());
        self.coordinates = candidate.coordinates;
    }
}

/// Parse a comma-separated tag entry: trimmed, de-duplicated, empties
/// dropped.
#[must_use]
pub fn parse_tags(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

// ---------------------------------------------------------------------------
// ItemField / ItemPatch
// ---------------------------------------------------------------------------

/// The settable fields of an [`Item`], used to report what a patch touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemField {
    Name,
    Address,
    ExternalPlaceRef,
    Rating,
    PriceLevel,
    Category,
    Tags,
    Notes,
    SupportsColdBrew,
    Coordinates,
}

/// A field-granular partial update.
///
/// `Some(_)` means "set this field"; for optional item fields the inner
/// option distinguishes "set to a value" from "clear". Fields the patch
/// does not mention are untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub address: Option<Option<String>>,
    pub external_place_ref: Option<Option<String>>,
    pub rating: Option<Rating>,
    pub price_level: Option<PriceLevel>,
    pub category: Option<Option<Category>>,
    pub tags: Option<BTreeSet<String>>,
    pub notes: Option<String>,
    pub supports_cold_brew: Option<bool>,
    pub coordinates: Option<Option<Coordinates>>,
}

impl ItemPatch {
    /// A patch that touches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the patch touches no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.external_place_ref.is_none()
            && self.rating.is_none()
            && self.price_level.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
            && self.supports_cold_brew.is_none()
            && self.coordinates.is_none()
    }

    /// The set of fields this patch touches.
    #[must_use]
    pub fn touched(&self) -> BTreeSet<ItemField> {
        let mut fields = BTreeSet::new();
        if self.name.is_some() {
            fields.insert(ItemField::Name);
        }
        if self.address.is_some() {
            fields.insert(ItemField::Address);
        }
        if self.external_place_ref.is_some() {
            fields.insert(ItemField::ExternalPlaceRef);
        }
        if self.rating.is_some() {
            fields.insert(ItemField::Rating);
        }
        if self.price_level.is_some() {
            fields.insert(ItemField::PriceLevel);
        }
        if self.category.is_some() {
            fields.insert(ItemField::Category);
        }
        if self.tags.is_some() {
            fields.insert(ItemField::Tags);
        }
        if self.notes.is_some() {
            fields.insert(ItemField::Notes);
        }
        if self.supports_cold_brew.is_some() {
            fields.insert(ItemField::SupportsColdBrew);
        }
        if self.coordinates.is_some() {
            fields.insert(ItemField::Coordinates);
        }
        fields
    }

    /// Whether the patch touches `field`.
    #[must_use]
    pub fn touches(&self, field: ItemField) -> bool {
        self.touched().contains(&field)
    }

    /// Apply the patch's values to `item` in place.
    ///
    /// Does not touch `id`, `owner_id`, or the store-assigned timestamps.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name.clone_from(name);
        }
        if let Some(address) = &self.address {
            item.address.clone_from(address);
        }
        if let Some(place_ref) = &self.external_place_ref {
            item.external_place_ref.clone_from(place_ref);
        }
        if let Some(rating) = self.rating {
            item.rating = rating;
        }
        if let Some(price_level) = self.price_level {
            item.price_level = price_level;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(tags) = &self.tags {
            item.tags.clone_from(tags);
        }
        if let Some(notes) = &self.notes {
            item.notes.clone_from(notes);
        }
        if let Some(cold_brew) = self.supports_cold_brew {
            item.supports_cold_brew = cold_brew;
        }
        if let Some(coordinates) = self.coordinates {
            item.coordinates = coordinates;
        }
    }

    /// A copy of this patch touching only the fields in `fields`.
    #[must_use]
    pub fn restrict(&self, fields: &BTreeSet<ItemField>) -> Self {
        Self {
            name: self.name.clone().filter(|_| fields.contains(&ItemField::Name)),
            address: self
                .address
                .clone()
                .filter(|_| fields.contains(&ItemField::Address)),
            external_place_ref: self
                .external_place_ref
                .clone()
                .filter(|_| fields.contains(&ItemField::ExternalPlaceRef)),
            rating: self.rating.filter(|_| fields.contains(&ItemField::Rating)),
            price_level: self
                .price_level
                .filter(|_| fields.contains(&ItemField::PriceLevel)),
            category: self
                .category
                .filter(|_| fields.contains(&ItemField::Category)),
            tags: self.tags.clone().filter(|_| fields.contains(&ItemField::Tags)),
            notes: self
                .notes
                .clone()
                .filter(|_| fields.contains(&ItemField::Notes)),
            supports_cold_brew: self
                .supports_cold_brew
                .filter(|_| fields.contains(&ItemField::SupportsColdBrew)),
            coordinates: self
                .coordinates
                .filter(|_| fields.contains(&ItemField::Coordinates)),
        }
    }

    /// Capture `item`'s current values for every field this patch touches.
    ///
    /// Applying the returned patch restores those fields — the rollback
    /// record for an optimistic mutation.
    #[must_use]
    pub fn capture_prior(&self, item: &Item) -> Self {
        Self {
            name: self.name.as_ref().map(|_| item.name.clone()),
            address: self.address.as_ref().map(|_| item.address.clone()),
            external_place_ref: self
                .external_place_ref
                .as_ref()
                .map(|_| item.external_place_ref.clone()),
            rating: self.rating.map(|_| item.rating),
            price_level: self.price_level.map(|_| item.price_level),
            category: self.category.map(|_| item.category),
            tags: self.tags.as_ref().map(|_| item.tags.clone()),
            notes: self.notes.as_ref().map(|_| item.notes.clone()),
            supports_cold_brew: self.supports_cold_brew.map(|_| item.supports_cold_brew),
            coordinates: self.coordinates.map(|_| item.coordinates),
        }
    }
}

impl From<&ItemDraft> for ItemPatch {
    /// A patch setting every field to the draft's values — the full-form
    /// save shape.
    fn from(draft: &ItemDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            address: Some(draft.address.clone()),
            external_place_ref: Some(draft.external_place_ref.clone()),
            rating: Some(draft.rating),
            price_level: Some(draft.price_level),
            category: Some(draft.category),
            tags: Some(draft.tags.clone()),
            notes: Some(draft.notes.clone()),
            supports_cold_brew: Some(draft.supports_cold_brew),
            coordinates: Some(draft.coordinates),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
