//! The rendering seam.
//!
//! [`MapCanvas`] is what the synchronization layer draws on: the terminal
//! front-end implements it with styled text, tests with a recording
//! double, and a graphical shell would wrap its mapping widget. Overlay
//! handles are opaque; allocation is the canvas' business.

use pest_map_geometry::LatLng;

/// Opaque handle to a rendered overlay (polygon, label, or marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// What a point marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// A trap; `absence` marks a check that found no specimens.
    Trap {
        /// No specimens found at the last check.
        absence: bool,
    },
}

/// Surface the synchronization layer renders onto.
pub trait MapCanvas {
    /// Adds a boundary polygon in the given display color (hex).
    fn add_polygon(&mut self, ring: &[LatLng], color: &str) -> OverlayId;

    /// Adds a text label anchored at a point.
    fn add_label(&mut self, at: LatLng, text: &str) -> OverlayId;

    /// Adds a point marker.
    fn add_marker(&mut self, at: LatLng, kind: MarkerKind) -> OverlayId;

    /// Removes a previously added overlay. Unknown handles are ignored.
    fn remove(&mut self, overlay: OverlayId);

    /// Recenters the view.
    fn set_view(&mut self, center: LatLng, zoom: u8);
}
