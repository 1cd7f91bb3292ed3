#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map synchronization layer.
//!
//! Keeps the set of rendered overlays (field polygons and labels, trap
//! markers) equal to the current field/trap state without leaking
//! previously rendered overlays. Every change to the field list triggers
//! a full clear-and-re-add render pass; trap mutations announced on the
//! [`events::TrapEvents`] channel trigger per-field marker refreshes.
//!
//! Render passes are numbered. A trap fetch captures the generation it
//! was issued under, and its response is dropped if a newer pass has
//! started in the meantime, so a late-arriving response cannot resurrect
//! overlays that were already cleared. The HTTP request itself is not
//! cancelled.

pub mod canvas;
pub mod events;

use std::collections::BTreeMap;

use pest_map_api::ApiError;
use pest_map_field_models::{Field, status_color};
use pest_map_trap::TrapClient;
use pest_map_trap_models::Trap;

pub use canvas::{MapCanvas, MarkerKind, OverlayId};
pub use events::{TrapAction, TrapEvent, TrapEvents};

/// Zoom level used when focusing the most recently added field.
const FOCUS_ZOOM: u8 = 18;

/// Concurrent trap-listing requests during a full refresh.
const TRAP_FETCH_CONCURRENCY: usize = 8;

/// Overlay bookkeeping over a [`MapCanvas`].
pub struct MapSync<C: MapCanvas> {
    canvas: C,
    generation: u64,
    field_overlays: Vec<OverlayId>,
    polygon_fields: Vec<(OverlayId, i64)>,
    trap_overlays: BTreeMap<i64, Vec<OverlayId>>,
}

impl<C: MapCanvas> MapSync<C> {
    /// Wraps a canvas with empty overlay state.
    #[must_use]
    pub const fn new(canvas: C) -> Self {
        Self {
            canvas,
            generation: 0,
            field_overlays: Vec::new(),
            polygon_fields: Vec::new(),
            trap_overlays: BTreeMap::new(),
        }
    }

    /// The wrapped canvas.
    #[must_use]
    pub const fn canvas(&self) -> &C {
        &self.canvas
    }

    /// The current render generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Re-renders the field list: removes every tracked overlay, starts a
    /// new generation, adds one polygon plus one label per renderable
    /// field, and recenters on the list's last field when it has a
    /// center. Returns the new generation for subsequent trap fetches.
    ///
    /// Fields without a boundary or center are skipped silently; a field
    /// can be in a transient state between creation and server aggregate
    /// population.
    pub fn render_fields(&mut self, fields: &[Field]) -> u64 {
        self.clear_all();
        self.generation += 1;

        for field in fields {
            let Some(center) = field.center else {
                continue;
            };
            if field.boundary.is_empty() {
                continue;
            }

            let color = status_color(field.status);
            let polygon = self.canvas.add_polygon(&field.boundary, color);
            self.polygon_fields.push((polygon, field.id));
            self.field_overlays.push(polygon);

            let text = format!(
                "{}: {} pests",
                field.name,
                field.total_pests.unwrap_or(0)
            );
            let label = self.canvas.add_label(center, &text);
            self.field_overlays.push(label);
        }

        if let Some(center) = fields.last().and_then(|f| f.center) {
            self.canvas.set_view(center, FOCUS_ZOOM);
        }

        log::debug!(
            "Render pass {} drew {} field overlays",
            self.generation,
            self.field_overlays.len()
        );
        self.generation
    }

    /// Maps a clicked polygon overlay back to its field id.
    #[must_use]
    pub fn field_for_overlay(&self, overlay: OverlayId) -> Option<i64> {
        self.polygon_fields
            .iter()
            .find(|(id, _)| *id == overlay)
            .map(|(_, field_id)| *field_id)
    }

    /// Fetches one field's traps and replaces its markers.
    ///
    /// The response is discarded if a newer render pass started while the
    /// request was in flight.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the trap listing fails.
    pub async fn refresh_traps(
        &mut self,
        traps: &TrapClient,
        field_id: i64,
    ) -> Result<(), ApiError> {
        let generation = self.generation;
        let listed = traps.list_by_field(field_id).await?;
        self.apply_traps(generation, field_id, &listed);
        Ok(())
    }

    /// Fetches and re-renders traps for every field concurrently.
    ///
    /// Per-field failures are logged and skipped; a partial refresh is
    /// better than none.
    pub async fn refresh_all_traps(&mut self, traps: &TrapClient, fields: &[Field]) {
        use futures::stream::{self, StreamExt as _};

        let generation = self.generation;

        // Fire concurrent listings via buffered stream
        let results: Vec<_> = stream::iter(fields.iter().map(|field| {
            let field_id = field.id;
            async move { (field_id, traps.list_by_field(field_id).await) }
        }))
        .buffer_unordered(TRAP_FETCH_CONCURRENCY)
        .collect()
        .await;

        for (field_id, result) in results {
            match result {
                Ok(listed) => self.apply_traps(generation, field_id, &listed),
                Err(e) => log::warn!("Skipping trap refresh for field {field_id}: {e}"),
            }
        }
    }

    /// Reacts to a trap-changed event: refreshes the identified field, or
    /// every field when the payload names none.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when a targeted refresh fails; the
    /// refresh-all fallback only logs per-field failures.
    pub async fn handle_trap_event(
        &mut self,
        event: TrapEvent,
        traps: &TrapClient,
        fields: &[Field],
    ) -> Result<(), ApiError> {
        match event.field_id {
            Some(field_id) => self.refresh_traps(traps, field_id).await,
            None => {
                self.refresh_all_traps(traps, fields).await;
                Ok(())
            }
        }
    }

    /// Replaces the rendered markers of one field, unless the listing is
    /// from a superseded render pass.
    fn apply_traps(&mut self, generation: u64, field_id: i64, traps: &[Trap]) {
        if generation != self.generation {
            log::debug!(
                "Dropping stale trap listing for field {field_id} \
                 (generation {generation}, current {})",
                self.generation
            );
            return;
        }

        if let Some(old) = self.trap_overlays.remove(&field_id) {
            for overlay in old {
                self.canvas.remove(overlay);
            }
        }

        let mut markers = Vec::with_capacity(traps.len());
        for trap in traps {
            let at = pest_map_geometry::LatLng::new(trap.latitude, trap.longitude);
            let kind = MarkerKind::Trap {
                absence: trap.absence,
            };
            markers.push(self.canvas.add_marker(at, kind));
        }
        self.trap_overlays.insert(field_id, markers);
    }

    fn clear_all(&mut self) {
        for overlay in self.field_overlays.drain(..) {
            self.canvas.remove(overlay);
        }
        self.polygon_fields.clear();
        for (_, markers) in std::mem::take(&mut self.trap_overlays) {
            for overlay in markers {
                self.canvas.remove(overlay);
            }
        }
    }
}
