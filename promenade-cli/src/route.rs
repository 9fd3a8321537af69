//! Route commands: plan a tour, show a stored one, remove a stop.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use promenade_core::{Point, RouteId, RouteMutator, RoutePlanner, RouteRequest};
use promenade_data::OsrmRoadRouterConfig;
use promenade_data::routing::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, OsrmSettings};
use crate::{
    ARG_FILTER, ARG_KIND, ARG_OSRM_BASE_URL, ARG_OSRM_TIMEOUT_SECS, ARG_POI_ID, ARG_POINT,
    ARG_POIS_DB, ARG_RADIUS, ARG_ROUTE_ID, ARG_ROUTES_DB, CliError, DEFAULT_POIS_DB,
    DEFAULT_ROUTES_DB, ENV_REMOVE_POINT_POI_ID, ENV_REMOVE_POINT_ROUTE_ID, ENV_ROUTE_KIND,
    ENV_SHOW_ROUTE_ID, write_json,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "route",
    long_about = "Plan a direct walk between two points or a loop around one. \
                 Requests whose endpoints fall in the same 0.001 degree cells \
                 as a stored route are served from the route cache.",
    about = "Plan a walking tour"
)]
#[ortho_config(prefix = "PROMENADE")]
pub(crate) struct RouteArgs {
    /// Route kind: `direct` or `round`.
    #[arg(long = ARG_KIND, value_name = "kind")]
    #[serde(default)]
    pub(crate) kind: Option<String>,
    /// A `LAT,LON` endpoint. Direct walks take two, loops take one.
    #[arg(long = ARG_POINT, value_name = "LAT,LON")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) point: Vec<String>,
    /// Category to visit. Repeat for several; omit for all.
    #[arg(long = ARG_FILTER, value_name = "name")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) filter: Vec<String>,
    /// Loop radius in metres.
    #[arg(long = ARG_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Path to the route cache database.
    #[arg(long = ARG_ROUTES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) routes_db: Option<Utf8PathBuf>,
    /// Path to the POI catalogue database.
    #[arg(long = ARG_POIS_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) pois_db: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Deadline for each OSRM request, in seconds.
    #[arg(long = ARG_OSRM_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) osrm_timeout_secs: Option<u64>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    pub(crate) kind: String,
    pub(crate) points: Vec<Point>,
    pub(crate) filters: Vec<String>,
    pub(crate) radius_m: u32,
    pub(crate) routes_db: Utf8PathBuf,
    pub(crate) pois_db: Utf8PathBuf,
    pub(crate) osrm: OsrmSettings,
}

impl RouteConfig {
    /// Validate the request part of the configuration.
    pub(crate) fn request(&self) -> Result<RouteRequest, CliError> {
        Ok(RouteRequest::parse(
            &self.kind,
            &self.points,
            &self.filters,
            self.radius_m,
        )?)
    }
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let kind = args.kind.ok_or(CliError::MissingArgument {
            field: ARG_KIND,
            env: ENV_ROUTE_KIND,
        })?;
        let points = args
            .point
            .iter()
            .map(|value| parse_point(value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            kind,
            points,
            filters: args.filter,
            radius_m: args.radius.unwrap_or_default(),
            routes_db: args
                .routes_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_ROUTES_DB)),
            pois_db: args
                .pois_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_POIS_DB)),
            osrm: osrm_settings(args.osrm_base_url, args.osrm_timeout_secs),
        })
    }
}

/// CLI arguments for the `show` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "show", about = "Print a stored route without counting a visit")]
#[ortho_config(prefix = "PROMENADE")]
pub(crate) struct ShowArgs {
    /// Identifier of the route.
    #[arg(value_name = "route-id")]
    #[serde(default)]
    pub(crate) route_id: Option<RouteId>,
    /// Path to the route cache database.
    #[arg(long = ARG_ROUTES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) routes_db: Option<Utf8PathBuf>,
    /// Path to the POI catalogue database.
    #[arg(long = ARG_POIS_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) pois_db: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Deadline for each OSRM request, in seconds.
    #[arg(long = ARG_OSRM_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) osrm_timeout_secs: Option<u64>,
}

impl ShowArgs {
    pub(crate) fn into_config(self) -> Result<ShowConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ShowConfig::try_from(merged)
    }
}

/// Resolved `show` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShowConfig {
    pub(crate) route_id: RouteId,
    pub(crate) routes_db: Utf8PathBuf,
    pub(crate) pois_db: Utf8PathBuf,
    pub(crate) osrm: OsrmSettings,
}

impl TryFrom<ShowArgs> for ShowConfig {
    type Error = CliError;

    fn try_from(args: ShowArgs) -> Result<Self, Self::Error> {
        let route_id = args.route_id.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_ID,
            env: ENV_SHOW_ROUTE_ID,
        })?;
        Ok(Self {
            route_id,
            routes_db: args
                .routes_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_ROUTES_DB)),
            pois_db: args
                .pois_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_POIS_DB)),
            osrm: osrm_settings(args.osrm_base_url, args.osrm_timeout_secs),
        })
    }
}

/// CLI arguments for the `remove-point` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "remove-point",
    long_about = "Store a copy of a route that skips one point of interest. \
                 The original route is left untouched and keeps serving \
                 cached requests.",
    about = "Remove a point of interest from a route"
)]
#[ortho_config(prefix = "PROMENADE")]
pub(crate) struct RemovePointArgs {
    /// Identifier of the route to edit.
    #[arg(value_name = "route-id")]
    #[serde(default)]
    pub(crate) route_id: Option<RouteId>,
    /// Identifier of the point of interest to drop.
    #[arg(value_name = "poi-id")]
    #[serde(default)]
    pub(crate) poi_id: Option<u64>,
    /// Path to the route cache database.
    #[arg(long = ARG_ROUTES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) routes_db: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Deadline for each OSRM request, in seconds.
    #[arg(long = ARG_OSRM_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) osrm_timeout_secs: Option<u64>,
}

impl RemovePointArgs {
    pub(crate) fn into_config(self) -> Result<RemovePointConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RemovePointConfig::try_from(merged)
    }
}

/// Resolved `remove-point` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemovePointConfig {
    pub(crate) route_id: RouteId,
    pub(crate) poi_id: u64,
    pub(crate) routes_db: Utf8PathBuf,
    pub(crate) osrm: OsrmSettings,
}

impl TryFrom<RemovePointArgs> for RemovePointConfig {
    type Error = CliError;

    fn try_from(args: RemovePointArgs) -> Result<Self, Self::Error> {
        let route_id = args.route_id.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_ID,
            env: ENV_REMOVE_POINT_ROUTE_ID,
        })?;
        let poi_id = args.poi_id.ok_or(CliError::MissingArgument {
            field: ARG_POI_ID,
            env: ENV_REMOVE_POINT_POI_ID,
        })?;
        Ok(Self {
            route_id,
            poi_id,
            routes_db: args
                .routes_db
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_ROUTES_DB)),
            osrm: osrm_settings(args.osrm_base_url, args.osrm_timeout_secs),
        })
    }
}

fn osrm_settings(base_url: Option<String>, timeout_secs: Option<u64>) -> OsrmSettings {
    OsrmSettings {
        base_url: base_url.unwrap_or_else(|| OsrmRoadRouterConfig::default().base_url),
        timeout_secs: timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    }
}

/// Parse a `LAT,LON` pair. Range checks are left to request validation.
pub(crate) fn parse_point(value: &str) -> Result<Point, CliError> {
    let invalid = || CliError::InvalidPoint {
        value: value.to_owned(),
    };
    let (lat_text, lon_text) = value.split_once(',').ok_or_else(invalid)?;
    let lat = lat_text.trim().parse::<f64>().map_err(|_| invalid())?;
    let lon = lon_text.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(Point::new(lat, lon))
}

pub(crate) fn run_route_with(
    args: RouteArgs,
    backend: &dyn Backend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    // Rejected requests must not open databases or contact the router.
    let request = config.request()?;
    let planner = RoutePlanner::new(
        backend.route_store(&config.routes_db)?,
        backend.path_selector(&config.pois_db)?,
        backend.road_router(&config.osrm)?,
    );
    let route = planner.get_route(&request)?;
    write_json(writer, &route)
}

pub(crate) fn run_show_with(
    args: ShowArgs,
    backend: &dyn Backend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let planner = RoutePlanner::new(
        backend.route_store(&config.routes_db)?,
        backend.path_selector(&config.pois_db)?,
        backend.road_router(&config.osrm)?,
    );
    let route = planner.get_route_by_id(config.route_id)?;
    write_json(writer, &route)
}

pub(crate) fn run_remove_point_with(
    args: RemovePointArgs,
    backend: &dyn Backend,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let mutator = RouteMutator::new(
        backend.route_store(&config.routes_db)?,
        backend.road_router(&config.osrm)?,
    );
    let route = mutator.remove_point(config.route_id, config.poi_id)?;
    write_json(writer, &route)
}

#[cfg(test)]
pub(crate) fn route_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
