#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ring geometry for field boundaries.
//!
//! A field boundary is an ordered sequence of geographic coordinates (a
//! "ring"). Rings arrive both open and closed (first point repeated at the
//! end); every function here treats the sequence as cyclic, so both forms
//! produce identical results. All functions are pure and never panic on
//! degenerate input; callers validate ring size where it matters, using
//! [`MIN_RING_POINTS`].

use serde::{Deserialize, Serialize};

/// Minimum number of distinct points for a ring to enclose anything.
pub const MIN_RING_POINTS: usize = 3;

/// WGS84 equatorial radius in meters, as used by the spherical area
/// approximation.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A geographic coordinate, serialized as a `[lat, lng]` pair to match the
/// backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct LatLng {
    /// Latitude in degrees (WGS84).
    pub lat: f64,
    /// Longitude in degrees (WGS84).
    pub lng: f64,
}

impl LatLng {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for (f64, f64) {
    fn from(p: LatLng) -> Self {
        (p.lat, p.lng)
    }
}

/// Axis-aligned bounding rectangle of a ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum latitude/longitude corner.
    pub min: LatLng,
    /// Maximum latitude/longitude corner.
    pub max: LatLng,
}

impl BoundingBox {
    /// Whether a point falls inside this rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min.lat && lat <= self.max.lat && lng >= self.min.lng && lng <= self.max.lng
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::new(
            f64::midpoint(self.min.lat, self.max.lat),
            f64::midpoint(self.min.lng, self.max.lng),
        )
    }
}

/// Computes the bounding rectangle of a ring, or `None` for an empty ring.
#[must_use]
pub fn bounding_box(ring: &[LatLng]) -> Option<BoundingBox> {
    let first = ring.first()?;
    let mut bbox = BoundingBox {
        min: *first,
        max: *first,
    };
    for p in &ring[1..] {
        bbox.min.lat = bbox.min.lat.min(p.lat);
        bbox.min.lng = bbox.min.lng.min(p.lng);
        bbox.max.lat = bbox.max.lat.max(p.lat);
        bbox.max.lng = bbox.max.lng.max(p.lng);
    }
    Some(bbox)
}

/// Returns the bounds-center of a ring: the midpoint of its bounding
/// rectangle, `None` for an empty ring.
///
/// This is deliberately not the area-weighted centroid: the bounds-center
/// is what the map front-end uses for label placement and initial view
/// centering, and it is cheaper to compute.
#[must_use]
pub fn bounds_center(ring: &[LatLng]) -> Option<LatLng> {
    bounding_box(ring).map(|b| b.center())
}

/// Computes the area of a ring in square meters using a spherical
/// approximation.
///
/// For consecutive vertex pairs (in radians, cyclic including the
/// wrap-around pair) the signed sum `(λ2 − λ1) · (2 + sin φ1 + sin φ2)`
/// is accumulated and scaled by `R²/2`. The result is the absolute value,
/// so vertex order (clockwise vs counter-clockwise) does not matter, and
/// cyclic rotation of the vertex list leaves it unchanged. Rings with
/// fewer than [`MIN_RING_POINTS`] points have zero area.
#[must_use]
pub fn geodesic_area(ring: &[LatLng]) -> f64 {
    if ring.len() < MIN_RING_POINTS {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..ring.len() {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % ring.len()];
        sum += (p2.lng - p1.lng).to_radians()
            * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
    }

    (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

/// Computes the area of a ring in hectares.
#[must_use]
pub fn area_hectares(ring: &[LatLng]) -> f64 {
    geodesic_area(ring) / 10_000.0
}

/// Even-odd ray-casting point-in-ring test.
///
/// Casts a ray along the latitude line of the query point and toggles on
/// each crossing edge, iterating vertex pairs cyclically so open and
/// closed rings behave identically. Comparisons are strict, which gives a
/// half-open edge rule: a point exactly on a ring edge tests inside for
/// edges on one side of it and outside for the other. Rings with fewer
/// than [`MIN_RING_POINTS`] points contain nothing.
#[must_use]
pub fn point_in_ring(lat: f64, lng: f64, ring: &[LatLng]) -> bool {
    if ring.len() < MIN_RING_POINTS {
        return false;
    }

    let mut inside = false;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];

        if (a.lat > lat) != (b.lat > lat) {
            let crossing_lng = (b.lng - a.lng) * (lat - a.lat) / (b.lat - a.lat) + a.lng;
            if lng < crossing_lng {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(2.0, 2.0),
            LatLng::new(2.0, 0.0),
        ]
    }

    fn rotate(ring: &[LatLng], by: usize) -> Vec<LatLng> {
        let mut out = ring.to_vec();
        out.rotate_left(by);
        out
    }

    #[test]
    fn bounds_center_is_bbox_midpoint() {
        assert_eq!(bounds_center(&square()), Some(LatLng::new(1.0, 1.0)));

        // Irregular ring: center comes from min/max extremes, not the mean.
        let ring = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 4.0),
            LatLng::new(1.0, 4.0),
            LatLng::new(1.0, 0.0),
        ];
        assert_eq!(bounds_center(&ring), Some(LatLng::new(0.5, 2.0)));
    }

    #[test]
    fn bounds_center_of_empty_ring_is_none() {
        assert_eq!(bounds_center(&[]), None);
    }

    #[test]
    fn point_inside_square() {
        assert!(point_in_ring(1.0, 1.0, &square()));
    }

    #[test]
    fn point_far_outside_square() {
        assert!(!point_in_ring(5.0, 5.0, &square()));
    }

    #[test]
    fn containment_invariant_under_rotation() {
        let ring = square();
        for by in 0..ring.len() {
            let rotated = rotate(&ring, by);
            assert!(point_in_ring(1.0, 1.0, &rotated), "rotation {by}");
            assert!(!point_in_ring(5.0, 5.0, &rotated), "rotation {by}");
        }
    }

    #[test]
    fn convex_ring_contains_its_bounds_center() {
        let ring = vec![
            LatLng::new(-22.03, -50.05),
            LatLng::new(-22.03, -50.03),
            LatLng::new(-22.01, -50.03),
            LatLng::new(-22.01, -50.05),
        ];
        let c = bounds_center(&ring).unwrap();
        assert!(point_in_ring(c.lat, c.lng, &ring));
    }

    #[test]
    fn degenerate_rings_contain_nothing_and_have_no_area() {
        let two = vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)];
        assert!(!point_in_ring(0.5, 0.5, &two));
        assert!((geodesic_area(&two) - 0.0).abs() < f64::EPSILON);
        assert!((geodesic_area(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn area_positive_and_invariant_under_rotation_and_reversal() {
        let ring = square();
        let base = geodesic_area(&ring);
        assert!(base > 0.0);

        for by in 0..ring.len() {
            let rotated = rotate(&ring, by);
            assert!((geodesic_area(&rotated) - base).abs() < 1e-6, "rotation {by}");
        }

        let mut reversed = ring;
        reversed.reverse();
        assert!((geodesic_area(&reversed) - base).abs() < 1e-6);
    }

    #[test]
    fn open_and_closed_rings_agree() {
        let open = square();
        let mut closed = open.clone();
        closed.push(open[0]);

        assert!((geodesic_area(&open) - geodesic_area(&closed)).abs() < f64::EPSILON);
        assert_eq!(bounds_center(&open), bounds_center(&closed));
        assert_eq!(
            point_in_ring(1.0, 1.0, &open),
            point_in_ring(1.0, 1.0, &closed)
        );
    }

    #[test]
    fn area_of_a_known_ring_is_plausible() {
        // Roughly 1.1km x 1.1km at ~22°S: on the order of 100-130 ha.
        let ring = vec![
            LatLng::new(-22.030, -50.050),
            LatLng::new(-22.030, -50.040),
            LatLng::new(-22.020, -50.040),
            LatLng::new(-22.020, -50.050),
        ];
        let ha = area_hectares(&ring);
        assert!(ha > 90.0 && ha < 140.0, "got {ha} ha");
    }

    #[test]
    fn latlng_serializes_as_pair() {
        let p = LatLng::new(-22.028, -50.044);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[-22.028,-50.044]");
        let back: LatLng = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
