#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the pest map.
//!
//! Menu-driven front-end using `dialoguer`: fields and traps are listed,
//! drawn, placed, edited, and deleted against the live backend, with the
//! rendered map state mirrored by the [`TextCanvas`]. Repository calls
//! show a spinner while suspended; session expiry gets its own message
//! pointing at `login`, everything else a retry hint.

use console::style;
use dialoguer::{Confirm, Input, Select};
use pest_map_api::{ApiClient, ApiError};
use pest_map_cli_utils::MultiProgress;
use pest_map_controller::{ControllerError, InteractionController, TrapForm};
use pest_map_field::FieldRepository;
use pest_map_field_models::{Field, FieldPatch, FieldStatus, FieldTotals, PestCount};
use pest_map_geometry::LatLng;
use pest_map_sync::{MapSync, TrapEvent, TrapEvents};
use pest_map_trap::TrapClient;
use tokio::sync::broadcast;

use crate::canvas::TextCanvas;

/// Top-level actions available in the menu.
enum MenuAction {
    ShowMap,
    ListFields,
    ShowTotals,
    DrawField,
    PlaceTrap,
    EditField,
    DeleteField,
    Resync,
    Quit,
}

impl MenuAction {
    const ALL: &[Self] = &[
        Self::ShowMap,
        Self::ListFields,
        Self::ShowTotals,
        Self::DrawField,
        Self::PlaceTrap,
        Self::EditField,
        Self::DeleteField,
        Self::Resync,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ShowMap => "Show map",
            Self::ListFields => "List fields",
            Self::ShowTotals => "Show totals",
            Self::DrawField => "Draw a new field",
            Self::PlaceTrap => "Place a trap",
            Self::EditField => "Edit a field",
            Self::DeleteField => "Delete a field",
            Self::Resync => "Re-sync from backend",
            Self::Quit => "Quit",
        }
    }
}

/// Everything the menu loop owns. Repositories and the event channel
/// live here, at the application root; the map and controller receive
/// read-only slices and callbacks.
struct App {
    multi: MultiProgress,
    repo: FieldRepository,
    traps: TrapClient,
    events: TrapEvents,
    trap_feed: broadcast::Receiver<TrapEvent>,
    sync: MapSync<TextCanvas>,
    controller: InteractionController,
}

/// Runs the interactive menu loop.
///
/// # Errors
///
/// Returns an error only for terminal I/O failures; backend errors are
/// reported inline and the loop continues.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let client = ApiClient::from_env();
    let events = TrapEvents::new();
    let mut app = App {
        multi: multi.clone(),
        repo: FieldRepository::new(client.clone()),
        traps: TrapClient::new(client),
        trap_feed: events.subscribe(),
        events,
        sync: MapSync::new(TextCanvas::default()),
        controller: InteractionController::new(),
    };

    app.resync().await;

    loop {
        println!();
        let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match MenuAction::ALL[idx] {
            MenuAction::ShowMap => print!("{}", app.sync.canvas().summary()),
            MenuAction::ListFields => print_fields(app.repo.fields()),
            MenuAction::ShowTotals => print_totals(&app.repo.totals()),
            MenuAction::DrawField => app.draw_field().await?,
            MenuAction::PlaceTrap => app.place_trap().await?,
            MenuAction::EditField => app.edit_field().await?,
            MenuAction::DeleteField => app.delete_field().await?,
            MenuAction::Resync => app.resync().await,
            MenuAction::Quit => break,
        }

        app.drain_trap_events().await;
    }

    Ok(())
}

impl App {
    /// Full render pass plus trap refresh for every field.
    async fn rerender(&mut self) {
        self.sync.render_fields(self.repo.fields());
        let bar = pest_map_cli_utils::request_spinner(&self.multi, "Refreshing traps...");
        self.sync
            .refresh_all_traps(&self.traps, self.repo.fields())
            .await;
        bar.finish_and_clear();
    }

    /// Applies any trap-changed announcements since the last action.
    async fn drain_trap_events(&mut self) {
        loop {
            match self.trap_feed.try_recv() {
                Ok(event) => {
                    if let Err(e) = self
                        .sync
                        .handle_trap_event(event, &self.traps, self.repo.fields())
                        .await
                    {
                        report_api(&e);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // Missed events; refresh everything instead.
                    self.sync
                        .refresh_all_traps(&self.traps, self.repo.fields())
                        .await;
                }
                Err(_) => break,
            }
        }
    }

    /// Fetches the field list and re-renders everything. Runs once at
    /// startup to populate the cache, and on demand afterwards.
    async fn resync(&mut self) {
        let bar = pest_map_cli_utils::request_spinner(&self.multi, "Loading fields...");
        let result = self.repo.refresh().await.map(<[Field]>::len);
        bar.finish_and_clear();
        match result {
            Ok(count) => {
                println!("Loaded {count} fields.");
                self.rerender().await;
            }
            Err(e) => report_api(&e),
        }
    }

    async fn draw_field(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.controller.toggle_draw();
        println!("Enter boundary vertices as `lat,lng`; empty line to finish.");

        let mut ring = Vec::new();
        loop {
            let line: String = Input::new()
                .with_prompt(format!("vertex {}", ring.len() + 1))
                .allow_empty(true)
                .interact_text()?;
            if line.trim().is_empty() {
                break;
            }
            match parse_lat_lng(&line) {
                Some((lat, lng)) => ring.push(LatLng::new(lat, lng)),
                None => println!("{}", style("Use the form `lat,lng`.").yellow()),
            }
        }

        let pending = match self.controller.draw_complete(ring).map(Clone::clone) {
            Ok(pending) => pending,
            Err(e) => {
                println!("{}", style(e).red());
                self.controller.cancel();
                return Ok(());
            }
        };

        println!(
            "Captured {} vertices, {:.2} ha, centered at {:.4}, {:.4}.",
            pending.boundary.len(),
            pending.area_hectares,
            pending.center.lat,
            pending.center.lng
        );

        let name: String = Input::new().with_prompt("Field name").interact_text()?;
        let status = prompt_status(None)?;
        let pests = prompt_pests()?;

        if !Confirm::new()
            .with_prompt(format!("Create field \"{name}\"?"))
            .default(true)
            .interact()?
        {
            self.controller.cancel();
            println!("Discarded the drawn boundary.");
            return Ok(());
        }

        loop {
            let bar = pest_map_cli_utils::request_spinner(&self.multi, "Creating field...");
            let result = self
                .controller
                .confirm_field(&mut self.repo, &name, status, pests.clone())
                .await;
            bar.finish_and_clear();

            match result {
                Ok(field) => {
                    println!("Created field {} ({}).", field.name, field.id);
                    self.rerender().await;
                    return Ok(());
                }
                Err(ControllerError::Api(e)) => {
                    // The confirmation stays open for a retry.
                    report_api(&e);
                    if !Confirm::new()
                        .with_prompt("Retry?")
                        .default(true)
                        .interact()?
                    {
                        self.controller.cancel();
                        return Ok(());
                    }
                }
                Err(e) => {
                    println!("{}", style(e).red());
                    self.controller.cancel();
                    return Ok(());
                }
            }
        }
    }

    async fn place_trap(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.controller.toggle_place_trap();

        let line: String = Input::new()
            .with_prompt("Trap location (lat,lng)")
            .interact_text()?;
        let Some((lat, lng)) = parse_lat_lng(&line) else {
            println!("{}", style("Use the form `lat,lng`.").yellow());
            self.controller.cancel();
            return Ok(());
        };

        let bar = pest_map_cli_utils::request_spinner(&self.multi, "Resolving field...");
        let result = self
            .controller
            .place_trap(self.repo.fields(), &self.traps, lat, lng)
            .await
            .map(Clone::clone);
        bar.finish_and_clear();

        let pending = match result {
            Ok(pending) => pending,
            Err(e @ ControllerError::OutsideFields) => {
                println!("{}", style(e).yellow());
                self.controller.cancel();
                return Ok(());
            }
            Err(ControllerError::Api(e)) => {
                report_api(&e);
                self.controller.cancel();
                return Ok(());
            }
            Err(e) => {
                println!("{}", style(e).red());
                self.controller.cancel();
                return Ok(());
            }
        };

        println!("Placing a trap in {}.", style(&pending.field_name).bold());
        if let Some(existing) = &pending.existing {
            println!(
                "Found \"{}\" within the re-visit range; this visit updates it.",
                existing.name
            );
        }

        let name: String = Input::new()
            .with_prompt("Trap name")
            .with_initial_text(
                pending
                    .existing
                    .as_ref()
                    .map_or("Trap", |t| t.name.as_str()),
            )
            .interact_text()?;
        let note: String = Input::new()
            .with_prompt("Note")
            .with_initial_text(
                pending
                    .existing
                    .as_ref()
                    .and_then(|t| t.note.as_deref())
                    .unwrap_or(""),
            )
            .allow_empty(true)
            .interact_text()?;
        let absence = Confirm::new()
            .with_prompt("No specimens found (absence)?")
            .default(
                pending
                    .existing
                    .as_ref()
                    .is_some_and(|t| t.absence),
            )
            .interact()?;

        let form = TrapForm {
            name,
            note: if note.trim().is_empty() {
                None
            } else {
                Some(note)
            },
            photo: pending.existing.as_ref().and_then(|t| t.photo.clone()),
            photo_at: pending.existing.as_ref().and_then(|t| t.photo_at),
            absence,
        };

        loop {
            let bar = pest_map_cli_utils::request_spinner(&self.multi, "Saving trap...");
            let result = self
                .controller
                .confirm_trap(&self.traps, &self.events, form.clone())
                .await;
            bar.finish_and_clear();

            match result {
                Ok(trap) => {
                    println!("Saved trap {} ({}).", trap.name, trap.id);
                    return Ok(());
                }
                Err(ControllerError::Api(e)) => {
                    report_api(&e);
                    if !Confirm::new()
                        .with_prompt("Retry?")
                        .default(true)
                        .interact()?
                    {
                        self.controller.cancel();
                        return Ok(());
                    }
                }
                Err(e) => {
                    println!("{}", style(e).red());
                    self.controller.cancel();
                    return Ok(());
                }
            }
        }
    }

    async fn edit_field(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(idx) = self.pick_field("Which field to edit?")? else {
            return Ok(());
        };
        let field = &self.repo.fields()[idx];
        let id = field.id;

        let name: String = Input::new()
            .with_prompt("Name")
            .with_initial_text(field.name.as_str())
            .interact_text()?;
        let status = prompt_status(field.status)?;

        let patch = FieldPatch {
            name: Some(name),
            status: Some(status),
        };

        let bar = pest_map_cli_utils::request_spinner(&self.multi, "Updating field...");
        let result = self.repo.update(id, &patch).await;
        bar.finish_and_clear();

        match result {
            Ok(updated) => {
                println!("Updated field {}.", updated.name);
                self.rerender().await;
            }
            Err(e) => report_api(&e),
        }
        Ok(())
    }

    async fn delete_field(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(idx) = self.pick_field("Which field to delete?")? else {
            return Ok(());
        };
        let field = &self.repo.fields()[idx];
        let id = field.id;
        let name = field.name.clone();

        if !Confirm::new()
            .with_prompt(format!("Delete \"{name}\" and all of its traps?"))
            .default(false)
            .interact()?
        {
            return Ok(());
        }

        let bar = pest_map_cli_utils::request_spinner(&self.multi, "Deleting field...");
        let result = self.repo.delete(id).await;
        bar.finish_and_clear();

        match result {
            Ok(()) => {
                println!("Deleted \"{name}\".");
                self.rerender().await;
            }
            Err(e) => report_api(&e),
        }
        Ok(())
    }

    /// Field picker; `None` when the cache is empty.
    fn pick_field(&self, prompt: &str) -> Result<Option<usize>, Box<dyn std::error::Error>> {
        let fields = self.repo.fields();
        if fields.is_empty() {
            println!("No fields yet. Draw one first.");
            return Ok(None);
        }

        let labels: Vec<String> = fields
            .iter()
            .map(|f| format!("{} (id {})", f.name, f.id))
            .collect();
        let idx = Select::new()
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()?;
        Ok(Some(idx))
    }
}

/// Prints the cached field list with status colors.
pub fn print_fields(fields: &[Field]) {
    if fields.is_empty() {
        println!("No fields.");
        return;
    }

    for field in fields {
        let status = field
            .status
            .map_or_else(|| style("unset").dim(), style_status);
        let area = field
            .area
            .map_or_else(|| "?".to_string(), |a| format!("{a:.2}"));
        println!(
            "  {:>4}  {}  [{status}]  {area} ha, {} traps, {} pests",
            field.id,
            style(&field.name).bold(),
            field.active_traps.unwrap_or(0),
            field.total_pests.unwrap_or(0),
        );
    }
}

/// Prints aggregate totals.
pub fn print_totals(totals: &FieldTotals) {
    println!(
        "  {} fields, {} traps, {} pests over {:.2} ha",
        totals.total_fields,
        totals.total_traps,
        style(totals.total_pests).bold(),
        totals.total_area
    );
}

/// Reports a backend failure; session expiry gets the re-login hint.
pub fn report_api(error: &ApiError) {
    match error {
        ApiError::Unauthorized => {
            println!(
                "{} {}",
                style("Session expired.").red().bold(),
                "Run `pest_map_cli login` and try again."
            );
        }
        other => {
            println!(
                "{} {other}",
                style("Backend request failed:").red().bold()
            );
            println!("The backend may be offline; retry in a moment.");
        }
    }
}

fn style_status(status: FieldStatus) -> console::StyledObject<&'static str> {
    let label = match status {
        FieldStatus::Low => "low",
        FieldStatus::Medium => "medium",
        FieldStatus::High => "high",
        FieldStatus::Critical => "critical",
    };
    match status {
        FieldStatus::Low => style(label).green(),
        FieldStatus::Medium => style(label).yellow(),
        FieldStatus::High => style(label).color256(208),
        FieldStatus::Critical => style(label).red().bold(),
    }
}

fn prompt_status(current: Option<FieldStatus>) -> Result<FieldStatus, dialoguer::Error> {
    let labels: Vec<String> = FieldStatus::ALL.iter().map(ToString::to_string).collect();
    let default = current
        .and_then(|s| FieldStatus::ALL.iter().position(|x| *x == s))
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Infestation status")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(FieldStatus::ALL[idx])
}

fn prompt_pests() -> Result<Vec<PestCount>, dialoguer::Error> {
    let mut pests = Vec::new();
    println!("Record observed pests; empty species to finish.");
    loop {
        let species: String = Input::new()
            .with_prompt("Species")
            .allow_empty(true)
            .interact_text()?;
        if species.trim().is_empty() {
            break;
        }
        let count: i64 = Input::new().with_prompt("Count").default(1).interact_text()?;
        pests.push(PestCount {
            species: species.trim().to_string(),
            count,
        });
    }
    Ok(pests)
}

/// Parses a `lat,lng` pair.
fn parse_lat_lng(line: &str) -> Option<(f64, f64)> {
    let (lat, lng) = line.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    Some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(parse_lat_lng("-22.028, -50.044"), Some((-22.028, -50.044)));
        assert_eq!(parse_lat_lng("1,2"), Some((1.0, 2.0)));
        assert_eq!(parse_lat_lng("not a pair"), None);
        assert_eq!(parse_lat_lng("1;2"), None);
        assert_eq!(parse_lat_lng("1,"), None);
    }
}
