#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trap REST client.
//!
//! Thin calls with no client-side cache beyond the in-flight request; the
//! map synchronization layer re-fetches per field after any mutation.
//! Also hosts the nearby-trap resolution that makes placement idempotent
//! for "re-visit the same trap" workflows.

use pest_map_api::{ApiClient, ApiError};
use pest_map_trap_models::{NewTrap, Trap, TrapPatch};

/// Coordinate-distance threshold (degrees, ~80 m) under which a placed
/// trap is treated as a re-visit of an existing one.
pub const NEARBY_THRESHOLD_DEG: f64 = 8.0e-4;

/// Trap endpoint client.
pub struct TrapClient {
    client: ApiClient,
}

impl TrapClient {
    /// Wraps the shared backend client.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Lists the traps of one field (`GET /traps?fieldId=`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or decode failure.
    pub async fn list_by_field(&self, field_id: i64) -> Result<Vec<Trap>, ApiError> {
        let traps: Vec<Trap> = self
            .client
            .get_json(&format!("/traps?fieldId={field_id}"))
            .await?;
        log::debug!("Fetched {} traps for field {field_id}", traps.len());
        Ok(traps)
    }

    /// Creates a trap (`POST /traps`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or decode failure.
    pub async fn create(&self, input: &NewTrap) -> Result<Trap, ApiError> {
        let created: Trap = self.client.post_json("/traps", input).await?;
        log::info!(
            "Created trap {} in field {}",
            created.id,
            created.field_id
        );
        Ok(created)
    }

    /// Partially updates a trap (`PUT /traps/{id}`), the idempotent
    /// re-visit path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or decode failure.
    pub async fn update(&self, id: i64, patch: &TrapPatch) -> Result<Trap, ApiError> {
        let updated: Trap = self.client.put_json(&format!("/traps/{id}"), patch).await?;
        log::info!("Updated trap {id}");
        Ok(updated)
    }
}

/// Returns the first trap within [`NEARBY_THRESHOLD_DEG`] of the point,
/// in listing order.
///
/// Proximity is a per-axis check (|Δlat| and |Δlng| both under the
/// threshold), matching the placement form's pre-fill behavior.
#[must_use]
pub fn find_nearby(traps: &[Trap], lat: f64, lng: f64) -> Option<&Trap> {
    traps.iter().find(|t| {
        (t.latitude - lat).abs() <= NEARBY_THRESHOLD_DEG
            && (t.longitude - lng).abs() <= NEARBY_THRESHOLD_DEG
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trap(id: i64, lat: f64, lng: f64) -> Trap {
        Trap {
            id,
            name: format!("trap-{id}"),
            note: None,
            photo: None,
            photo_at: None,
            absence: false,
            latitude: lat,
            longitude: lng,
            field_id: 1,
        }
    }

    #[test]
    fn finds_a_trap_within_the_threshold() {
        let traps = [trap(1, -22.0281, -50.0443), trap(2, -22.0400, -50.0600)];
        let hit = find_nearby(&traps, -22.0285, -50.0440).unwrap();
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn ignores_traps_past_the_threshold() {
        // 0.001° on either axis is beyond the ~80m window.
        let traps = [trap(1, -22.0281, -50.0443)];
        assert!(find_nearby(&traps, -22.0271, -50.0443).is_none());
        assert!(find_nearby(&traps, -22.0281, -50.0453).is_none());
    }

    #[test]
    fn both_axes_must_be_near() {
        let traps = [trap(1, 0.0, 0.0)];
        assert!(find_nearby(&traps, 0.0005, 0.002).is_none());
        assert!(find_nearby(&traps, 0.0005, 0.0005).is_some());
    }

    #[test]
    fn first_listed_nearby_trap_wins() {
        let traps = [trap(1, 0.0, 0.0), trap(2, 0.0002, 0.0002)];
        let hit = find_nearby(&traps, 0.0001, 0.0001).unwrap();
        assert_eq!(hit.id, 1);
    }
}
