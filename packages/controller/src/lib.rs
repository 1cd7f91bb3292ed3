#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interaction flows over the map.
//!
//! Two user flows share one controller: drawing a new field boundary and
//! placing a trap. The modes are mutually exclusive with normal map
//! panning and with each other; arming one while the other is armed
//! cancels back to idle. A completed action or an explicit cancel always
//! returns to idle.
//!
//! Trap placement is gated on the membership test: the clicked point must
//! fall inside exactly one cached field's boundary before any network
//! call happens. Placement near an existing trap (within the ~80 m
//! threshold) pre-fills the confirmation with that trap's data and turns
//! the confirmation into an update, so re-visiting a trap is idempotent.

use chrono::{DateTime, Utc};
use pest_map_api::ApiError;
use pest_map_field::{FieldRepository, field_containing};
use pest_map_field_models::{Field, FieldStatus, NewField, PestCount};
use pest_map_geometry::{LatLng, MIN_RING_POINTS, area_hectares, bounds_center};
use pest_map_sync::{TrapAction, TrapEvent, TrapEvents};
use pest_map_trap::{TrapClient, find_nearby};
use pest_map_trap_models::{NewTrap, Trap, TrapPatch};
use thiserror::Error;

/// Which interaction, if any, is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Normal panning/zooming.
    #[default]
    Idle,
    /// The drawing tool is armed; the next draw-complete event captures
    /// a field boundary.
    Drawing,
    /// The next map click places a trap.
    PlacingTrap,
}

/// Errors from the interaction flows.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The clicked point is not inside any cached field.
    #[error("Place the trap inside a field.")]
    OutsideFields,

    /// The drawn ring has fewer than three distinct points.
    #[error("A field boundary needs at least {MIN_RING_POINTS} distinct points.")]
    DegenerateRing,

    /// The confirmation form was submitted without a name.
    #[error("A name is required.")]
    EmptyName,

    /// The flow's mode is not armed or there is nothing pending.
    #[error("Nothing is armed for that action.")]
    NotArmed,

    /// The backend call failed; the pending confirmation is kept so the
    /// user can retry.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A drawn boundary awaiting name/status confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingField {
    /// The ring exactly as drawn.
    pub boundary: Vec<LatLng>,
    /// Bounds-center of the ring.
    pub center: LatLng,
    /// Derived area in hectares.
    pub area_hectares: f64,
}

/// A resolved trap placement awaiting detail confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrap {
    /// Field the click resolved to.
    pub field_id: i64,
    /// Its name, for the confirmation dialog.
    pub field_name: String,
    /// Clicked latitude.
    pub latitude: f64,
    /// Clicked longitude.
    pub longitude: f64,
    /// Nearby existing trap whose data pre-fills the form; when set,
    /// confirmation updates this trap instead of creating a new one.
    pub existing: Option<Trap>,
}

impl PendingTrap {
    /// Builds the pending placement from a resolved field, the clicked
    /// point, and that field's current trap listing.
    #[must_use]
    pub fn from_click(field: &Field, lat: f64, lng: f64, listed: &[Trap]) -> Self {
        Self {
            field_id: field.id,
            field_name: field.name.clone(),
            latitude: lat,
            longitude: lng,
            existing: find_nearby(listed, lat, lng).cloned(),
        }
    }

    /// Id of the trap an eventual confirmation will update, if any.
    #[must_use]
    pub fn existing_id(&self) -> Option<i64> {
        self.existing.as_ref().map(|t| t.id)
    }
}

/// Details collected by the trap confirmation form.
#[derive(Debug, Clone, Default)]
pub struct TrapForm {
    /// Display name.
    pub name: String,
    /// Free-text note.
    pub note: Option<String>,
    /// Photo reference.
    pub photo: Option<String>,
    /// When the photo was taken.
    pub photo_at: Option<DateTime<Utc>>,
    /// No specimens found.
    pub absence: bool,
}

/// Orchestrates the draw-field and place-trap flows.
#[derive(Debug, Default)]
pub struct InteractionController {
    mode: Mode,
    pending_field: Option<PendingField>,
    pending_trap: Option<PendingTrap>,
}

impl InteractionController {
    /// Starts idle with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently armed mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The boundary awaiting confirmation, if any.
    #[must_use]
    pub const fn pending_field(&self) -> Option<&PendingField> {
        self.pending_field.as_ref()
    }

    /// The trap placement awaiting confirmation, if any.
    #[must_use]
    pub const fn pending_trap(&self) -> Option<&PendingTrap> {
        self.pending_trap.as_ref()
    }

    /// Arms or disarms the drawing tool. Arming from any non-idle state
    /// cancels back to idle; pending geometry is discarded either way.
    pub fn toggle_draw(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Idle => Mode::Drawing,
            Mode::Drawing | Mode::PlacingTrap => Mode::Idle,
        };
        self.pending_field = None;
        self.pending_trap = None;
        self.mode
    }

    /// Arms or disarms trap placement, with the same exclusivity rules
    /// as [`Self::toggle_draw`].
    pub fn toggle_place_trap(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Idle => Mode::PlacingTrap,
            Mode::Drawing | Mode::PlacingTrap => Mode::Idle,
        };
        self.pending_field = None;
        self.pending_trap = None;
        self.mode
    }

    /// Discards any pending confirmation and returns to idle.
    pub fn cancel(&mut self) {
        self.mode = Mode::Idle;
        self.pending_field = None;
        self.pending_trap = None;
    }

    /// Accepts a completed drawing: derives the bounds-center and area,
    /// disarms the tool, and leaves the result pending confirmation.
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotArmed`] when drawing is not armed;
    /// [`ControllerError::DegenerateRing`] when the ring has fewer than
    /// three distinct points (closure duplicates do not count).
    pub fn draw_complete(&mut self, ring: Vec<LatLng>) -> Result<&PendingField, ControllerError> {
        if self.mode != Mode::Drawing {
            return Err(ControllerError::NotArmed);
        }

        if distinct_points(&ring) < MIN_RING_POINTS {
            return Err(ControllerError::DegenerateRing);
        }
        let Some(center) = bounds_center(&ring) else {
            return Err(ControllerError::DegenerateRing);
        };

        let area = area_hectares(&ring);
        self.mode = Mode::Idle;
        log::debug!("Captured boundary, {area:.2} ha");
        Ok(self.pending_field.insert(PendingField {
            boundary: ring,
            center,
            area_hectares: area,
        }))
    }

    /// Confirms the pending field with user-supplied details and creates
    /// it through the repository.
    ///
    /// On any failure the pending confirmation survives so the flow can
    /// be retried; it is only cleared by success or [`Self::cancel`].
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotArmed`] with nothing pending,
    /// [`ControllerError::EmptyName`] for a blank name, or the
    /// repository's [`ApiError`].
    pub async fn confirm_field(
        &mut self,
        repo: &mut FieldRepository,
        name: &str,
        status: FieldStatus,
        pests: Vec<PestCount>,
    ) -> Result<Field, ControllerError> {
        let pending = self.pending_field.as_ref().ok_or(ControllerError::NotArmed)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ControllerError::EmptyName);
        }

        let input = NewField {
            name: name.to_string(),
            area: pending.area_hectares,
            status,
            center_lat: pending.center.lat,
            center_lng: pending.center.lng,
            boundary: pending.boundary.clone(),
            pests,
        };

        let created = repo.create(&input).await?;
        self.pending_field = None;
        Ok(created)
    }

    /// Resolves a map click to the field containing it, without any
    /// network access.
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotArmed`] when placement is not armed;
    /// [`ControllerError::OutsideFields`] when no cached field contains
    /// the point. Rejection keeps the mode armed; it is not a completed
    /// action.
    pub fn resolve_click(
        &self,
        fields: &[Field],
        lat: f64,
        lng: f64,
    ) -> Result<(i64, String), ControllerError> {
        if self.mode != Mode::PlacingTrap {
            return Err(ControllerError::NotArmed);
        }

        field_containing(fields, lat, lng)
            .map(|f| (f.id, f.name.clone()))
            .ok_or(ControllerError::OutsideFields)
    }

    /// Handles an armed map click end to end: membership resolution,
    /// then a nearby-trap lookup so a re-visit pre-fills the form.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_click`]; additionally propagates the trap
    /// listing's [`ApiError`].
    pub async fn place_trap(
        &mut self,
        fields: &[Field],
        traps: &TrapClient,
        lat: f64,
        lng: f64,
    ) -> Result<&PendingTrap, ControllerError> {
        let (field_id, _) = self.resolve_click(fields, lat, lng)?;

        // resolve_click only returns ids that came from the slice.
        let field = fields
            .iter()
            .find(|f| f.id == field_id)
            .ok_or(ControllerError::OutsideFields)?;

        let listed = traps.list_by_field(field.id).await?;
        Ok(self
            .pending_trap
            .insert(PendingTrap::from_click(field, lat, lng, &listed)))
    }

    /// Confirms the pending trap placement: creates a new trap, or
    /// updates the pre-filled existing one, then announces the change.
    ///
    /// On failure the pending placement survives and the mode stays
    /// armed for a retry.
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotArmed`] with nothing pending,
    /// [`ControllerError::EmptyName`] for a blank name, or the client's
    /// [`ApiError`].
    pub async fn confirm_trap(
        &mut self,
        traps: &TrapClient,
        events: &TrapEvents,
        form: TrapForm,
    ) -> Result<Trap, ControllerError> {
        let pending = self.pending_trap.as_ref().ok_or(ControllerError::NotArmed)?;

        let name = form.name.trim();
        if name.is_empty() {
            return Err(ControllerError::EmptyName);
        }

        let input = NewTrap {
            name: name.to_string(),
            note: form.note,
            photo: form.photo,
            photo_at: form.photo_at,
            absence: form.absence,
            latitude: pending.latitude,
            longitude: pending.longitude,
            field_id: pending.field_id,
        };

        let (saved, action) = match pending.existing_id() {
            Some(existing_id) => {
                let patch = TrapPatch::from(&input);
                (traps.update(existing_id, &patch).await?, TrapAction::Updated)
            }
            None => (traps.create(&input).await?, TrapAction::Created),
        };

        events.publish(TrapEvent {
            action,
            field_id: Some(saved.field_id),
            trap_id: Some(saved.id),
        });

        self.pending_trap = None;
        self.mode = Mode::Idle;
        Ok(saved)
    }
}

/// Counts distinct vertices, so a closing duplicate does not make a
/// two-point ring look like three.
fn distinct_points(ring: &[LatLng]) -> usize {
    let mut distinct: Vec<LatLng> = Vec::with_capacity(ring.len());
    for p in ring {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    distinct.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pest_map_api::{ApiClient, session::Session};

    fn square_at(lat: f64, lng: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(lat, lng),
            LatLng::new(lat, lng + 1.0),
            LatLng::new(lat + 1.0, lng + 1.0),
            LatLng::new(lat + 1.0, lng),
        ]
    }

    fn field(id: i64, ring: Vec<LatLng>) -> Field {
        Field {
            id,
            name: format!("field-{id}"),
            area: Some(1.0),
            status: Some(FieldStatus::Low),
            last_collection: None,
            total_pests: Some(0),
            active_traps: Some(0),
            center: bounds_center(&ring),
            boundary: ring,
            pests: None,
        }
    }

    fn trap(id: i64, lat: f64, lng: f64) -> Trap {
        Trap {
            id,
            name: format!("trap-{id}"),
            note: Some("borda".to_string()),
            photo: None,
            photo_at: None,
            absence: false,
            latitude: lat,
            longitude: lng,
            field_id: 1,
        }
    }

    #[test]
    fn modes_toggle_and_exclude_each_other() {
        let mut ctl = InteractionController::new();
        assert_eq!(ctl.mode(), Mode::Idle);

        assert_eq!(ctl.toggle_draw(), Mode::Drawing);
        assert_eq!(ctl.toggle_draw(), Mode::Idle);

        assert_eq!(ctl.toggle_place_trap(), Mode::PlacingTrap);
        // Arming the other mode cancels instead of stacking.
        assert_eq!(ctl.toggle_draw(), Mode::Idle);
    }

    #[test]
    fn draw_complete_requires_an_armed_tool() {
        let mut ctl = InteractionController::new();
        let result = ctl.draw_complete(square_at(0.0, 0.0));
        assert!(matches!(result, Err(ControllerError::NotArmed)));
    }

    #[test]
    fn draw_complete_rejects_degenerate_rings() {
        let mut ctl = InteractionController::new();
        ctl.toggle_draw();

        // Two distinct points plus a closing duplicate.
        let ring = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(0.0, 0.0),
        ];
        assert!(matches!(
            ctl.draw_complete(ring),
            Err(ControllerError::DegenerateRing)
        ));
    }

    #[test]
    fn draw_complete_derives_center_and_area_and_disarms() {
        let mut ctl = InteractionController::new();
        ctl.toggle_draw();

        let pending = ctl.draw_complete(square_at(0.0, 0.0)).unwrap();
        assert_eq!(pending.center, LatLng::new(0.5, 0.5));
        assert!(pending.area_hectares > 0.0);

        assert_eq!(ctl.mode(), Mode::Idle);
        assert!(ctl.pending_field().is_some());
    }

    #[tokio::test]
    async fn empty_name_keeps_the_confirmation_open() {
        let mut ctl = InteractionController::new();
        ctl.toggle_draw();
        ctl.draw_complete(square_at(0.0, 0.0)).unwrap();

        let client = ApiClient::new(
            "http://localhost:0",
            Session::new(std::env::temp_dir().join("pest-map-ctl-test.token")),
        );
        let mut repo = FieldRepository::new(client);

        let result = ctl
            .confirm_field(&mut repo, "   ", FieldStatus::Low, vec![])
            .await;
        assert!(matches!(result, Err(ControllerError::EmptyName)));
        // Still pending: the user fixes the name and retries.
        assert!(ctl.pending_field().is_some());
    }

    #[test]
    fn click_inside_the_second_field_resolves_to_it() {
        let mut ctl = InteractionController::new();
        ctl.toggle_place_trap();

        let a = field(1, square_at(0.0, 0.0));
        let b = field(2, square_at(10.0, 10.0));

        let (field_id, name) = ctl.resolve_click(&[a, b], 10.5, 10.5).unwrap();
        assert_eq!(field_id, 2);
        assert_eq!(name, "field-2");
    }

    #[test]
    fn click_outside_every_field_is_rejected_and_stays_armed() {
        let mut ctl = InteractionController::new();
        ctl.toggle_place_trap();

        let a = field(1, square_at(0.0, 0.0));
        let result = ctl.resolve_click(&[a], 5.0, 5.0);

        assert!(matches!(result, Err(ControllerError::OutsideFields)));
        assert_eq!(ctl.mode(), Mode::PlacingTrap);
        assert!(ctl.pending_trap().is_none());
    }

    #[test]
    fn click_without_arming_is_rejected() {
        let ctl = InteractionController::new();
        let a = field(1, square_at(0.0, 0.0));
        assert!(matches!(
            ctl.resolve_click(&[a], 0.5, 0.5),
            Err(ControllerError::NotArmed)
        ));
    }

    #[test]
    fn nearby_trap_prefills_an_update() {
        let owner = field(1, square_at(0.0, 0.0));
        let listed = [trap(9, 0.5000, 0.5000)];

        let pending = PendingTrap::from_click(&owner, 0.5004, 0.5004, &listed);
        assert_eq!(pending.existing_id(), Some(9));
        assert_eq!(
            pending.existing.as_ref().unwrap().note.as_deref(),
            Some("borda")
        );
    }

    #[test]
    fn distant_traps_do_not_prefill() {
        let owner = field(1, square_at(0.0, 0.0));
        let listed = [trap(9, 0.5, 0.5)];

        let pending = PendingTrap::from_click(&owner, 0.9, 0.9, &listed);
        assert_eq!(pending.existing_id(), None);
    }

    #[test]
    fn cancel_discards_pending_state() {
        let mut ctl = InteractionController::new();
        ctl.toggle_draw();
        ctl.draw_complete(square_at(0.0, 0.0)).unwrap();

        ctl.cancel();
        assert_eq!(ctl.mode(), Mode::Idle);
        assert!(ctl.pending_field().is_none());
    }
}
