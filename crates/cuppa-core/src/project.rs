//! Derived projection: search, category filter, sort.
//!
//! `project` is pure and total — same mirror, same spec, same output,
//! bit-identical. Ordering ties always break by id ascending so the
//! output is reproducible across recomputation; the marker reconciler's
//! diffing depends on that stability.
//!
//! The [`Projector`] wrapper memoizes on `(mirror version, spec)` so
//! hosts that re-render eagerly don't recompute an unchanged projection.

use std::cmp::Ordering;

use crate::model::item::{Category, Item};
use crate::sync::SyncEngine;

// ---------------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------------

/// Case-insensitive search text. Empty matches everything.
///
/// Matches against name, address, and tags — the fields the search box
/// has always covered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    /// A query over `text`, normalized for case-insensitive matching.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            needle: text.as_ref().trim().to_lowercase(),
        }
    }

    /// Whether the query matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Whether `item` matches.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        if item.name.to_lowercase().contains(&self.needle) {
            return true;
        }
        if let Some(address) = &item.address
            && address.to_lowercase().contains(&self.needle)
        {
            return true;
        }
        item.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&self.needle))
    }
}

/// Category filter: everything, or one exact category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No category restriction.
    #[default]
    All,
    /// Only items filed under exactly this category.
    Only(Category),
}

impl CategoryFilter {
    /// Whether `item` passes the filter.
    #[must_use]
    pub fn matches(self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => item.category == Some(category),
        }
    }
}

/// Which field drives the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Rating,
    PriceLevel,
    CreatedAt,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Field + direction. Ties break by id ascending, always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest first — the order the catalog opened with historically.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    fn compare(self, a: &Item, b: &Item) -> Ordering {
        let primary = match self.field {
            SortField::Rating => a.rating.cmp(&b.rating),
            SortField::PriceLevel => a.price_level.cmp(&b.price_level),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        // Tie-break by id ascending regardless of direction.
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// The full projection input: what the table and the map both consume.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionSpec {
    pub query: SearchQuery,
    pub category: CategoryFilter,
    pub sort: SortSpec,
}

// ---------------------------------------------------------------------------
// project
// ---------------------------------------------------------------------------

/// Filter and order `items` per `spec`. Pure; no caching.
pub fn project<'a, I>(items: I, spec: &ProjectionSpec) -> Vec<Item>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut visible: Vec<Item> = items
        .into_iter()
        .filter(|item| spec.query.matches(item) && spec.category.matches(item))
        .cloned()
        .collect();
    visible.sort_by(|a, b| spec.sort.compare(a, b));
    visible
}

// ---------------------------------------------------------------------------
// Projector (memoizing wrapper)
// ---------------------------------------------------------------------------

/// Memoizes [`project`] on `(mirror version, spec)`.
#[derive(Debug, Default)]
pub struct Projector {
    memo: Option<MemoEntry>,
}

#[derive(Debug)]
struct MemoEntry {
    version: u64,
    spec: ProjectionSpec,
    output: Vec<Item>,
}

impl Projector {
    /// A projector with an empty memo.
    #[must_use]
    pub const fn new() -> Self {
        Self { memo: None }
    }

    /// The projection of `sync`'s mirror under `spec`, recomputed only
    /// when the mirror version or the spec changed.
    pub fn project(&mut self, sync: &SyncEngine, spec: &ProjectionSpec) -> &[Item] {
        let version = sync.version();
        let fresh = self
            .memo
            .as_ref()
            .is_some_and(|memo| memo.version == version && memo.spec == *spec);
        if !fresh {
            self.memo = Some(MemoEntry {
                version,
                spec: spec.clone(),
                output: project(sync.items(), spec),
            });
        }
        self.memo
            .as_ref()
            .map(|memo| memo.output.as_slice())
            .unwrap_or(&[])
    }

    /// Drop the memo (scope switch, teardown).
    pub fn invalidate(&mut self) {
        self.memo = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
