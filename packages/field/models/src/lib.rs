#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field boundary and infestation status types.
//!
//! A field is a user-delineated area under pest monitoring: a drawn
//! boundary ring, a display status, and server-computed infestation
//! aggregates. These types mirror the backend's JSON contract; the
//! aggregate fields (`total_pests`, `active_traps`) are server-owned and
//! never recomputed client-side.

use pest_map_geometry::LatLng;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Infestation level of a field, used only for display color.
///
/// There are no transition rules; the backend stores whatever the user
/// last picked.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldStatus {
    /// Low infestation.
    Low,
    /// Medium infestation.
    Medium,
    /// High infestation.
    High,
    /// Critical infestation.
    Critical,
}

impl FieldStatus {
    /// All statuses, in escalation order.
    pub const ALL: &[Self] = &[Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Display color (hex) for map overlays.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#22c55e",
            Self::Medium => "#eab308",
            Self::High => "#f97316",
            Self::Critical => "#dc2626",
        }
    }
}

/// Display color for a possibly-unset status; gray when unknown.
#[must_use]
pub const fn status_color(status: Option<FieldStatus>) -> &'static str {
    match status {
        Some(s) => s.color(),
        None => "#6b7280",
    }
}

/// An observed pest species count, free-form (not validated against a
/// master species list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PestCount {
    /// Species name as entered by the user.
    pub species: String,
    /// Number of specimens counted.
    pub count: i64,
}

/// A field as returned by the backend.
///
/// Freshly created fields may be in a transient state where the
/// aggregates (and even `center`/`boundary`) are not yet populated; the
/// map layer skips those rather than treating them as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Server-assigned id.
    pub id: i64,
    /// User-editable display name.
    pub name: String,
    /// Area in hectares, derived from the drawn ring at creation and
    /// never recomputed afterwards.
    pub area: Option<f64>,
    /// Infestation status.
    pub status: Option<FieldStatus>,
    /// Timestamp label of the most recent trap collection.
    pub last_collection: Option<String>,
    /// Server-computed total pest count across the field's traps.
    pub total_pests: Option<i64>,
    /// Server-computed count of active traps.
    pub active_traps: Option<i64>,
    /// Bounds-center of the boundary, used for labels and view centering.
    pub center: Option<LatLng>,
    /// Boundary ring, exactly as drawn (closure optional).
    #[serde(default)]
    pub boundary: Vec<LatLng>,
    /// Pest species counts entered at creation.
    pub pests: Option<Vec<PestCount>>,
}

/// Payload for creating a field.
///
/// The center is flattened into two scalar fields on the wire; the
/// boundary ships exactly as drawn, with no reordering or deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewField {
    /// Display name.
    pub name: String,
    /// Derived area in hectares.
    pub area: f64,
    /// Initial infestation status.
    pub status: FieldStatus,
    /// Bounds-center latitude.
    pub center_lat: f64,
    /// Bounds-center longitude.
    pub center_lng: f64,
    /// Boundary ring as drawn.
    pub boundary: Vec<LatLng>,
    /// Pest species counts.
    pub pests: Vec<PestCount>,
}

/// Partial update for a field; only name and status ever change after
/// creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New infestation status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FieldStatus>,
}

/// Aggregate totals over the cached field list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTotals {
    /// Count of all cached fields, including those with unpopulated
    /// aggregates.
    pub total_fields: usize,
    /// Sum of active trap counts over fields with complete aggregates.
    pub total_traps: i64,
    /// Sum of pest counts over fields with complete aggregates.
    pub total_pests: i64,
    /// Sum of areas (hectares) over fields with complete aggregates.
    pub total_area: f64,
}
