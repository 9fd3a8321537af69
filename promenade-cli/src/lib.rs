//! Command-line interface for planning and inspecting Promenade walking tours.
//!
//! Every subcommand layers its settings from configuration files,
//! `PROMENADE_CMDS_<COMMAND>_*` environment variables and flags, in rising
//! order of precedence. Results are printed to stdout as pretty JSON.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod backend;
mod error;
mod import;
mod route;

pub use error::CliError;

use backend::{Backend, SqliteOsrmBackend};
use import::{ImportPoisArgs, run_import_pois_with};
use route::{
    RemovePointArgs, RouteArgs, ShowArgs, run_remove_point_with, run_route_with, run_show_with,
};

pub(crate) const ARG_KIND: &str = "kind";
pub(crate) const ARG_POINT: &str = "point";
pub(crate) const ARG_FILTER: &str = "filter";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_ROUTE_ID: &str = "route-id";
pub(crate) const ARG_POI_ID: &str = "poi-id";
pub(crate) const ARG_POIS_FILE: &str = "pois-file";
pub(crate) const ARG_ROUTES_DB: &str = "routes-db";
pub(crate) const ARG_POIS_DB: &str = "pois-db";
pub(crate) const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_OSRM_TIMEOUT_SECS: &str = "osrm-timeout-secs";

pub(crate) const ENV_ROUTE_KIND: &str = "PROMENADE_CMDS_ROUTE_KIND";
pub(crate) const ENV_SHOW_ROUTE_ID: &str = "PROMENADE_CMDS_SHOW_ROUTE_ID";
pub(crate) const ENV_REMOVE_POINT_ROUTE_ID: &str = "PROMENADE_CMDS_REMOVE_POINT_ROUTE_ID";
pub(crate) const ENV_REMOVE_POINT_POI_ID: &str = "PROMENADE_CMDS_REMOVE_POINT_POI_ID";
pub(crate) const ENV_IMPORT_POIS_FILE: &str = "PROMENADE_CMDS_IMPORT_POIS_POIS_FILE";

/// Default location of the route cache database.
pub const DEFAULT_ROUTES_DB: &str = "routes.db";

/// Default location of the POI catalogue database.
pub const DEFAULT_POIS_DB: &str = "pois.db";

/// Run the Promenade CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments, configuration, storage, routing or
/// output fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &SqliteOsrmBackend, &mut stdout)
}

fn run_command(
    command: Command,
    backend: &dyn Backend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Route(args) => run_route_with(args, backend, writer),
        Command::Show(args) => run_show_with(args, backend, writer),
        Command::RemovePoint(args) => run_remove_point_with(args, backend, writer),
        Command::ImportPois(args) => run_import_pois_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "promenade",
    about = "Plan, cache and edit pedestrian tours through points of interest",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan a tour, serving it from the route cache when possible.
    Route(RouteArgs),
    /// Print a stored route.
    Show(ShowArgs),
    /// Store a copy of a route without one of its points of interest.
    RemovePoint(RemovePointArgs),
    /// Seed the POI catalogue from a JSON array.
    ImportPois(ImportPoisArgs),
}

/// Serialise `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
