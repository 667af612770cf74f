//! Terminal map surface.
//!
//! Implements the engine's [`MapSurface`] over plain text: markers are
//! kept in a table, viewport requests are recorded, and `render` prints
//! the result. This is the host-side map collaborator for a terminal —
//! drawing is someone else's problem, the marker/viewport contract is the
//! same one a real map widget would receive.

use std::collections::BTreeMap;
use std::io::{self, Write};

use cuppa_core::markers::MapSurface;
use cuppa_core::model::item::Coordinates;

/// The viewport request from the last reconciliation, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewport {
    /// Frame all markers inside the given bounds.
    Bounds {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    },
    /// Fixed zoom level (single marker).
    Zoom(u8),
}

#[derive(Debug, Clone, PartialEq)]
struct TextMarker {
    position: Coordinates,
    label: String,
}

/// Text-table [`MapSurface`].
#[derive(Debug, Default)]
pub struct TextMapSurface {
    markers: BTreeMap<String, TextMarker>,
    viewport: Option<Viewport>,
}

impl TextMapSurface {
    /// An empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markers currently drawn.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// The last viewport request.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Print the marker table and viewport line.
    pub fn render(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.markers.is_empty() {
            writeln!(w, "(no mapped shops — add coordinates to see them here)")?;
            return Ok(());
        }
        writeln!(w, "{:<10} {:>10} {:>11}  LABEL", "ID", "LAT", "LNG")?;
        for (id, marker) in &self.markers {
            writeln!(
                w,
                "{:<10} {:>10.5} {:>11.5}  {}",
                id, marker.position.lat, marker.position.lng, marker.label
            )?;
        }
        match &self.viewport {
            Some(Viewport::Bounds {
                south,
                west,
                north,
                east,
            }) => writeln!(
                w,
                "viewport: bounds ({south:.5},{west:.5}) .. ({north:.5},{east:.5})"
            )?,
            Some(Viewport::Zoom(level)) => writeln!(w, "viewport: zoom {level}")?,
            None => {}
        }
        Ok(())
    }

    /// Markers and viewport as stable JSON for `--format json`.
    pub fn to_json(&self) -> serde_json::Value {
        let markers: Vec<_> = self
            .markers
            .iter()
            .map(|(id, m)| {
                serde_json::json!({
                    "id": id,
                    "lat": m.position.lat,
                    "lng": m.position.lng,
                    "label": m.label,
                })
            })
            .collect();
        let viewport = match self.viewport() {
            Some(Viewport::Bounds {
                south,
                west,
                north,
                east,
            }) => serde_json::json!({
                "bounds": { "south": south, "west": west, "north": north, "east": east }
            }),
            Some(Viewport::Zoom(level)) => serde_json::json!({ "zoom": level }),
            None => serde_json::Value::Null,
        };
        serde_json::json!({ "markers": markers, "viewport": viewport })
    }
}

impl MapSurface for TextMapSurface {
    fn add_marker(&mut self, id: &str, position: Coordinates, label: &str) {
        self.markers.insert(
            id.to_string(),
            TextMarker {
                position,
                label: label.to_string(),
            },
        );
    }

    fn update_marker(&mut self, id: &str, position: Coordinates, label: &str) {
        self.markers.insert(
            id.to_string(),
            TextMarker {
                position,
                label: label.to_string(),
            },
        );
    }

    fn remove_marker(&mut self, id: &str) {
        self.markers.remove(id);
    }

    fn fit_bounds(&mut self, positions: &[Coordinates]) {
        let mut south = f64::INFINITY;
        let mut west = f64::INFINITY;
        let mut north = f64::NEG_INFINITY;
        let mut east = f64::NEG_INFINITY;
        for p in positions {
            south = south.min(p.lat);
            north = north.max(p.lat);
            west = west.min(p.lng);
            east = east.max(p.lng);
        }
        if positions.is_empty() {
            self.viewport = None;
        } else {
            self.viewport = Some(Viewport::Bounds {
                south,
                west,
                north,
                east,
            });
        }
    }

    fn set_zoom(&mut self, level: u8) {
        self.viewport = Some(Viewport::Zoom(level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).expect("valid")
    }

    #[test]
    fn markers_round_trip_through_surface_ops() {
        let mut surface = TextMapSurface::new();
        surface.add_marker("srv-1", at(39.70, -105.00), "A (4)");
        surface.add_marker("srv-2", at(39.75, -104.95), "B (3.5)");
        surface.update_marker("srv-1", at(39.71, -105.00), "A (4.5)");
        surface.remove_marker("srv-2");
        assert_eq!(surface.marker_count(), 1);

        let mut rendered = Vec::new();
        surface.render(&mut rendered).expect("render");
        let text = String::from_utf8(rendered).expect("utf8");
        assert!(text.contains("srv-1"));
        assert!(text.contains("A (4.5)"));
        assert!(!text.contains("srv-2"));
    }

    #[test]
    fn fit_bounds_computes_extent() {
        let mut surface = TextMapSurface::new();
        surface.fit_bounds(&[at(39.70, -105.00), at(39.75, -104.95)]);
        assert_eq!(
            surface.viewport(),
            Some(&Viewport::Bounds {
                south: 39.70,
                west: -105.00,
                north: 39.75,
                east: -104.95,
            })
        );
    }

    #[test]
    fn empty_surface_renders_placeholder() {
        let surface = TextMapSurface::new();
        let mut rendered = Vec::new();
        surface.render(&mut rendered).expect("render");
        let text = String::from_utf8(rendered).expect("utf8");
        assert!(text.contains("no mapped shops"));
    }
}
