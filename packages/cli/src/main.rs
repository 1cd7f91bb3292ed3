#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive terminal front-end for the pest map.
//!
//! Without a subcommand this drops into the menu loop (list fields, draw
//! boundaries, place traps, totals). The `login`/`logout` subcommands
//! manage the stored session token; `fields` and `totals` are one-shot
//! queries for scripting.
//!
//! Backend location comes from `PEST_MAP_API_URL`; the session token is
//! stored under the data directory (`PEST_MAP_DATA_DIR` to relocate).

mod canvas;
mod interactive;

use clap::{Parser, Subcommand};
use pest_map_api::{ApiClient, session::Session};
use pest_map_field::FieldRepository;

#[derive(Parser)]
#[command(name = "pest_map_cli", about = "Field pest monitoring front-end")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Store a session token for backend calls.
    Login {
        /// Bearer token; prompted for when omitted.
        token: Option<String>,
    },
    /// Clear the stored session token.
    Logout,
    /// List fields and exit.
    Fields,
    /// Show aggregate totals and exit.
    Totals,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pest_map_cli_utils::init_logger();

    let args = Args::parse();
    match args.command {
        Some(Command::Login { token }) => login(token)?,
        Some(Command::Logout) => {
            Session::default_location().clear()?;
            println!("Session cleared.");
        }
        Some(Command::Fields) => {
            if let Some(repo) = load_repository(&multi).await {
                interactive::print_fields(repo.fields());
            }
        }
        Some(Command::Totals) => {
            if let Some(repo) = load_repository(&multi).await {
                interactive::print_totals(&repo.totals());
            }
        }
        None => interactive::run(&multi).await?,
    }

    Ok(())
}

fn login(token: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let token = match token {
        Some(token) => token,
        None => dialoguer::Password::new()
            .with_prompt("Session token")
            .interact()?,
    };

    let session = Session::default_location();
    session.store(&token)?;
    println!("Session stored.");
    Ok(())
}

/// One-shot repository load for the scripting subcommands.
async fn load_repository(multi: &pest_map_cli_utils::MultiProgress) -> Option<FieldRepository> {
    let mut repo = FieldRepository::new(ApiClient::from_env());

    let bar = pest_map_cli_utils::request_spinner(multi, "Loading fields...");
    let result = repo.refresh().await.map(|_| ());
    bar.finish_and_clear();

    match result {
        Ok(()) => Some(repo),
        Err(e) => {
            interactive::report_api(&e);
            None
        }
    }
}
