//! Text rendering of the map state.
//!
//! [`TextCanvas`] implements the synchronization layer's canvas seam by
//! keeping the current overlay set in memory and printing it on demand,
//! instead of drawing tiles. Remove/re-add churn from render passes stays
//! invisible; the user only sees the reconciled result.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use console::style;
use pest_map_geometry::LatLng;
use pest_map_sync::{MapCanvas, MarkerKind, OverlayId};

enum Overlay {
    Polygon { vertices: usize, color: String },
    Label { at: LatLng, text: String },
    Marker { at: LatLng, kind: MarkerKind },
}

/// In-memory overlay set with a printable summary.
#[derive(Default)]
pub struct TextCanvas {
    next: u64,
    overlays: BTreeMap<u64, Overlay>,
    view: Option<(LatLng, u8)>,
}

impl TextCanvas {
    fn insert(&mut self, overlay: Overlay) -> OverlayId {
        self.next += 1;
        self.overlays.insert(self.next, overlay);
        OverlayId(self.next)
    }

    /// Renders the current overlay set as styled terminal lines.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();

        if let Some((center, zoom)) = self.view {
            let _ = writeln!(
                out,
                "view centered at {:.4}, {:.4} (zoom {zoom})",
                center.lat, center.lng
            );
        }

        for overlay in self.overlays.values() {
            match overlay {
                Overlay::Polygon { vertices, color } => {
                    let _ = writeln!(
                        out,
                        "  {} boundary with {vertices} vertices ({color})",
                        style("⬟").green()
                    );
                }
                Overlay::Label { at, text } => {
                    let _ = writeln!(
                        out,
                        "  {} {} at {:.4}, {:.4}",
                        style("▣").cyan(),
                        style(text).bold(),
                        at.lat,
                        at.lng
                    );
                }
                Overlay::Marker { at, kind } => {
                    let MarkerKind::Trap { absence } = kind;
                    let note = if *absence { " (no specimens)" } else { "" };
                    let _ = writeln!(
                        out,
                        "  {} trap at {:.4}, {:.4}{note}",
                        style("◉").yellow(),
                        at.lat,
                        at.lng
                    );
                }
            }
        }

        if self.overlays.is_empty() {
            out.push_str("  (nothing rendered)\n");
        }
        out
    }
}

impl MapCanvas for TextCanvas {
    fn add_polygon(&mut self, ring: &[LatLng], color: &str) -> OverlayId {
        self.insert(Overlay::Polygon {
            vertices: ring.len(),
            color: color.to_string(),
        })
    }

    fn add_label(&mut self, at: LatLng, text: &str) -> OverlayId {
        self.insert(Overlay::Label {
            at,
            text: text.to_string(),
        })
    }

    fn add_marker(&mut self, at: LatLng, kind: MarkerKind) -> OverlayId {
        self.insert(Overlay::Marker { at, kind })
    }

    fn remove(&mut self, overlay: OverlayId) {
        self.overlays.remove(&overlay.0);
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.view = Some((center, zoom));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_adds_and_removes() {
        let mut canvas = TextCanvas::default();
        let polygon = canvas.add_polygon(
            &[
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 1.0),
                LatLng::new(1.0, 1.0),
            ],
            "#22c55e",
        );
        canvas.add_label(LatLng::new(0.5, 0.5), "Talhao Norte: 3 pests");

        let summary = canvas.summary();
        assert!(summary.contains("3 vertices"));
        assert!(summary.contains("Talhao Norte"));

        canvas.remove(polygon);
        assert!(!canvas.summary().contains("vertices"));
    }

    #[test]
    fn empty_canvas_says_so() {
        let canvas = TextCanvas::default();
        assert!(canvas.summary().contains("nothing rendered"));
    }
}
