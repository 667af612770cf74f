//! Map marker reconciliation.
//!
//! The reconciler keeps the external map surface in step with the
//! projection by diffing, never rebuilding: one create per newly visible
//! item with coordinates, one removal per marker whose item left the
//! projection, one in-place update per marker whose position or label
//! changed. Unchanged markers are not touched. Marker identity is the
//! item id and persists across reconciliations within one scope binding.
//!
//! On scope switch the tracked set is cleared before the next
//! reconciliation runs, so markers from the old scope are removed rather
//! than diffed against the new one.

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::item::{Coordinates, Item};

/// Close-in zoom requested when exactly one marker is visible; a
/// single-point `fit_bounds` would be a degenerate zero-area viewport.
pub const SINGLE_MARKER_ZOOM: u8 = 15;

// ---------------------------------------------------------------------------
// MapSurface
// ---------------------------------------------------------------------------

/// The external map surface collaborator.
///
/// Drawing primitives, tiles, and styling are the surface's business; the
/// engine only issues marker and viewport operations.
pub trait MapSurface {
    fn add_marker(&mut self, id: &str, position: Coordinates, label: &str);
    fn update_marker(&mut self, id: &str, position: Coordinates, label: &str);
    fn remove_marker(&mut self, id: &str);
    fn fit_bounds(&mut self, positions: &[Coordinates]);
    fn set_zoom(&mut self, level: u8);
}

// ---------------------------------------------------------------------------
// MarkerReconciler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct TrackedMarker {
    position: Coordinates,
    label: String,
}

/// Diff-based bridge between the projection and a [`MapSurface`].
#[derive(Debug, Default)]
pub struct MarkerReconciler {
    tracked: BTreeMap<String, TrackedMarker>,
    pending_reset: bool,
}

impl MarkerReconciler {
    /// A reconciler tracking no markers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tracked: BTreeMap::new(),
            pending_reset: false,
        }
    }

    /// Marker label: name plus current rating.
    #[must_use]
    pub fn label_for(item: &Item) -> String {
        format!("{} ({})", item.name, item.rating)
    }

    /// Forget all tracked markers; the next [`reconcile`](Self::reconcile)
    /// removes them from the surface before diffing the new scope's items.
    pub fn reset(&mut self) {
        self.pending_reset = true;
    }

    /// Remove every tracked marker from `surface` immediately (teardown).
    pub fn clear(&mut self, surface: &mut dyn MapSurface) {
        for id in std::mem::take(&mut self.tracked).into_keys() {
            surface.remove_marker(&id);
        }
        self.pending_reset = false;
    }

    /// Number of markers currently tracked.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    /// Bring `surface` in step with `visible`.
    ///
    /// Issues exactly one `add_marker` per newly visible item with
    /// coordinates, one `remove_marker` per tracked marker no longer
    /// visible, and one `update_marker` per marker whose position or
    /// label changed. When the visible-with-coordinates set is non-empty
    /// and its geometry changed, requests viewport framing: `fit_bounds`
    /// over all positions, or [`SINGLE_MARKER_ZOOM`] for a lone marker.
    pub fn reconcile(&mut self, visible: &[Item], surface: &mut dyn MapSurface) {
        if self.pending_reset {
            self.clear(surface);
        }

        let desired: Vec<(&str, Coordinates, String)> = visible
            .iter()
            .filter_map(|item| {
                item.coordinates
                    .map(|position| (item.id.as_str(), position, Self::label_for(item)))
            })
            .collect();

        // Removals first: markers whose items left the projection.
        let keep: std::collections::BTreeSet<&str> =
            desired.iter().map(|(id, _, _)| *id).collect();
        let stale: Vec<String> = self
            .tracked
            .keys()
            .filter(|id| !keep.contains(id.as_str()))
            .cloned()
            .collect();
        let mut geometry_changed = !stale.is_empty();
        for id in stale {
            surface.remove_marker(&id);
            self.tracked.remove(&id);
        }

        // Creates and in-place updates.
        for (id, position, label) in &desired {
            match self.tracked.get(*id) {
                None => {
                    surface.add_marker(id, *position, label);
                    self.tracked.insert(
                        (*id).to_string(),
                        TrackedMarker {
                            position: *position,
                            label: label.clone(),
                        },
                    );
                    geometry_changed = true;
                }
                Some(current)
                    if current.position != *position || current.label != *label =>
                {
                    if current.position != *position {
                        geometry_changed = true;
                    }
                    surface.update_marker(id, *position, label);
                    self.tracked.insert(
                        (*id).to_string(),
                        TrackedMarker {
                            position: *position,
                            label: label.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }

        // Viewport framing, only when the marker geometry moved.
        if geometry_changed && !desired.is_empty() {
            if desired.len() == 1 {
                surface.set_zoom(SINGLE_MARKER_ZOOM);
            } else {
                let positions: Vec<Coordinates> =
                    desired.iter().map(|(_, p, _)| *p).collect();
                surface.fit_bounds(&positions);
            }
        }

        debug!(
            visible = visible.len(),
            markers = self.tracked.len(),
            "markers reconciled"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
