#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trap record types.
//!
//! A trap is a point location inside a field where pest specimens are
//! collected or observed. A trap check that found no specimens is recorded
//! with the `absence` flag rather than omitted, so the collection history
//! stays complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trap as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trap {
    /// Server-assigned id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free-text observation note.
    pub note: Option<String>,
    /// Photo reference (URL or opaque storage key).
    pub photo: Option<String>,
    /// When the photo was taken.
    pub photo_at: Option<DateTime<Utc>>,
    /// Trap was checked and no specimens were found.
    #[serde(default)]
    pub absence: bool,
    /// Point latitude.
    pub latitude: f64,
    /// Point longitude.
    pub longitude: f64,
    /// Owning field id.
    pub field_id: i64,
}

/// Payload for creating a trap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrap {
    /// Display name.
    pub name: String,
    /// Free-text observation note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Photo reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// When the photo was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_at: Option<DateTime<Utc>>,
    /// No specimens found at this check.
    pub absence: bool,
    /// Point latitude.
    pub latitude: f64,
    /// Point longitude.
    pub longitude: f64,
    /// Owning field id, resolved by the membership test at placement.
    pub field_id: i64,
}

/// Partial update for a trap, used by the re-visit workflow. Absent
/// fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrapPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New observation note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// New photo reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// New photo timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_at: Option<DateTime<Utc>>,
    /// New absence flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence: Option<bool>,
}

impl From<&NewTrap> for TrapPatch {
    /// A re-visit submits the same form as a create; this maps it onto
    /// the update payload for the existing trap.
    fn from(input: &NewTrap) -> Self {
        Self {
            name: Some(input.name.clone()),
            note: input.note.clone(),
            photo: input.photo.clone(),
            photo_at: input.photo_at,
            absence: Some(input.absence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trap_deserializes_from_backend_json() {
        let json = r#"{
            "id": 3,
            "name": "Armadilha 1",
            "note": "borda norte",
            "photo": null,
            "photoAt": "2026-07-28T14:30:00Z",
            "absence": false,
            "latitude": -22.0281,
            "longitude": -50.0443,
            "fieldId": 7
        }"#;

        let trap: Trap = serde_json::from_str(json).unwrap();
        assert_eq!(trap.id, 3);
        assert_eq!(trap.field_id, 7);
        assert!(!trap.absence);
        assert!(trap.photo_at.is_some());
    }

    #[test]
    fn absence_defaults_to_false_when_missing() {
        let json = r#"{
            "id": 4,
            "name": "a",
            "note": null,
            "photo": null,
            "photoAt": null,
            "latitude": 0.0,
            "longitude": 0.0,
            "fieldId": 1
        }"#;
        let trap: Trap = serde_json::from_str(json).unwrap();
        assert!(!trap.absence);
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = TrapPatch {
            note: Some("revisita".to_string()),
            absence: Some(true),
            ..TrapPatch::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"note": "revisita", "absence": true})
        );
    }

    #[test]
    fn revisit_patch_carries_the_full_form() {
        let input = NewTrap {
            name: "Armadilha 2".to_string(),
            note: None,
            photo: Some("fotos/2.jpg".to_string()),
            photo_at: None,
            absence: true,
            latitude: -22.0,
            longitude: -50.0,
            field_id: 7,
        };
        let patch = TrapPatch::from(&input);
        assert_eq!(patch.name.as_deref(), Some("Armadilha 2"));
        assert_eq!(patch.photo.as_deref(), Some("fotos/2.jpg"));
        assert_eq!(patch.absence, Some(true));
        assert_eq!(patch.note, None);
    }
}
