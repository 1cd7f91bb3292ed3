#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client-side field cache and REST repository.
//!
//! Holds the in-memory list of fields fetched from the backend and keeps
//! it consistent across create/update/delete calls. The cache is owned by
//! the application root; the map and panel layers receive read-only
//! slices and route mutations back through the repository.

use pest_map_api::{ApiClient, ApiError};
use pest_map_field_models::{Field, FieldPatch, FieldTotals, NewField};
use pest_map_geometry::{bounding_box, point_in_ring};

/// Cached field list plus its backend client.
pub struct FieldRepository {
    client: ApiClient,
    fields: Vec<Field>,
}

impl FieldRepository {
    /// Creates an empty repository; call [`Self::refresh`] once at
    /// startup to populate it.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self {
            client,
            fields: Vec::new(),
        }
    }

    /// The current cached fields, in server order. Never touches the
    /// network.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Re-fetches the full field list (`GET /fields`), replacing the
    /// cache.
    ///
    /// On failure the cache is emptied rather than left stale.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`]; [`ApiError::Unauthorized`] means the session
    /// expired and the user should be prompted to log in again.
    pub async fn refresh(&mut self) -> Result<&[Field], ApiError> {
        match self.client.get_json::<Vec<Field>>("/fields").await {
            Ok(fields) => {
                log::debug!("Fetched {} fields", fields.len());
                self.fields = fields;
                Ok(&self.fields)
            }
            Err(e) => {
                self.fields.clear();
                Err(e)
            }
        }
    }

    /// Creates a field (`POST /fields`) and appends the server's response
    /// (with assigned id and aggregates) to the cache, in insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`]; the cache is unchanged on failure.
    pub async fn create(&mut self, input: &NewField) -> Result<Field, ApiError> {
        let created: Field = self.client.post_json("/fields", input).await?;
        log::info!("Created field {} ({})", created.id, created.name);
        self.fields.push(created.clone());
        Ok(created)
    }

    /// Updates a field's name/status (`PUT /fields/{id}`) and replaces
    /// the cached entry with the server's response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`]; the cache is unchanged on failure.
    pub async fn update(&mut self, id: i64, patch: &FieldPatch) -> Result<Field, ApiError> {
        let updated: Field = self.client.put_json(&format!("/fields/{id}"), patch).await?;
        if let Some(slot) = self.fields.iter_mut().find(|f| f.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Deletes a field (`DELETE /fields/{id}`) and removes it from the
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`]; the cache is unchanged on failure.
    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("/fields/{id}")).await?;
        self.fields.retain(|f| f.id != id);
        log::info!("Deleted field {id}");
        Ok(())
    }

    /// Aggregate totals over the cache, recomputed on every call.
    #[must_use]
    pub fn totals(&self) -> FieldTotals {
        totals(&self.fields)
    }

    /// First cached field containing the point, in cache order.
    #[must_use]
    pub fn field_at(&self, lat: f64, lng: f64) -> Option<&Field> {
        field_containing(&self.fields, lat, lng)
    }
}

/// Computes aggregate totals over a field list.
///
/// The field count includes every field, but the sums only cover fields
/// with all three of area/total-pests/active-traps populated: a freshly
/// created field whose aggregates the server has not computed yet should
/// not skew the sums with null-as-zero, but it still is a field.
#[must_use]
pub fn totals(fields: &[Field]) -> FieldTotals {
    let complete = fields
        .iter()
        .filter(|f| f.total_pests.is_some() && f.active_traps.is_some() && f.area.is_some());

    let mut result = FieldTotals {
        total_fields: fields.len(),
        total_traps: 0,
        total_pests: 0,
        total_area: 0.0,
    };
    for field in complete {
        result.total_traps += field.active_traps.unwrap_or(0);
        result.total_pests += field.total_pests.unwrap_or(0);
        result.total_area += field.area.unwrap_or(0.0);
    }
    result
}

/// Returns the first field whose boundary contains the point, in cache
/// order.
///
/// Fields are assumed non-overlapping, so first match wins; with
/// overlapping boundaries the earlier-listed field silently takes the
/// point. A cheap bounding-box check runs before the exact ray-casting
/// test. Fields without a boundary never match.
#[must_use]
pub fn field_containing(fields: &[Field], lat: f64, lng: f64) -> Option<&Field> {
    fields.iter().find(|field| {
        bounding_box(&field.boundary)
            .is_some_and(|bbox| bbox.contains(lat, lng) && point_in_ring(lat, lng, &field.boundary))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pest_map_geometry::LatLng;

    fn field(id: i64, ring: Vec<LatLng>) -> Field {
        Field {
            id,
            name: format!("field-{id}"),
            area: Some(1.0),
            status: None,
            last_collection: None,
            total_pests: Some(0),
            active_traps: Some(0),
            center: pest_map_geometry::bounds_center(&ring),
            boundary: ring,
            pests: None,
        }
    }

    fn unit_square_at(lat: f64, lng: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(lat, lng),
            LatLng::new(lat, lng + 1.0),
            LatLng::new(lat + 1.0, lng + 1.0),
            LatLng::new(lat + 1.0, lng),
        ]
    }

    #[test]
    fn totals_count_all_fields_but_sum_only_complete_ones() {
        let complete = Field {
            area: Some(5.0),
            total_pests: Some(10),
            active_traps: Some(2),
            ..field(1, unit_square_at(0.0, 0.0))
        };
        let transient = Field {
            area: None,
            total_pests: None,
            active_traps: None,
            ..field(2, vec![])
        };

        let t = totals(&[complete, transient]);
        assert_eq!(t.total_fields, 2);
        assert_eq!(t.total_traps, 2);
        assert_eq!(t.total_pests, 10);
        assert!((t.total_area - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn totals_of_empty_cache_are_zero() {
        let t = totals(&[]);
        assert_eq!(t.total_fields, 0);
        assert_eq!(t.total_traps, 0);
        assert!((t.total_area - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_in_second_field_resolves_to_it() {
        let a = field(1, unit_square_at(0.0, 0.0));
        let b = field(2, unit_square_at(10.0, 10.0));
        let fields = [a, b];

        let hit = field_containing(&fields, 10.5, 10.5).unwrap();
        assert_eq!(hit.id, 2);
    }

    #[test]
    fn point_outside_every_field_resolves_to_none() {
        let a = field(1, unit_square_at(0.0, 0.0));
        let b = field(2, unit_square_at(10.0, 10.0));
        let fields = [a, b];

        assert!(field_containing(&fields, 5.0, 5.0).is_none());
    }

    #[test]
    fn overlapping_fields_take_the_first_match() {
        let a = field(1, unit_square_at(0.0, 0.0));
        let b = field(2, unit_square_at(0.5, 0.5));
        let fields = [a, b];

        // 0.75/0.75 is inside both rings; cache order decides.
        let hit = field_containing(&fields, 0.75, 0.75).unwrap();
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn boundaryless_fields_never_match() {
        let transient = field(1, vec![]);
        assert!(field_containing(&[transient], 0.0, 0.0).is_none());
    }
}
