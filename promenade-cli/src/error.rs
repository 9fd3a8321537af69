//! Error types emitted by the Promenade CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use promenade_core::{PlannerError, ValidationError};
#[cfg(feature = "store-sqlite")]
use promenade_core::SqliteRouteStoreError;
use promenade_data::{CatalogueError, ProviderBuildError};
use thiserror::Error;

/// Errors emitted by the Promenade CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name of the option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The requested operation requires a missing compile-time feature.
    #[error("{action} requires the `{feature}` feature to be enabled")]
    MissingFeature {
        /// Cargo feature that would enable the operation.
        feature: &'static str,
        /// What was attempted.
        action: &'static str,
    },
    /// A `--point` value is not a `LAT,LON` pair.
    #[error("point '{value}' is not a LAT,LON pair of decimal degrees")]
    InvalidPoint {
        /// The value as supplied.
        value: String,
    },
    /// The route request was rejected before any work was done.
    #[error("invalid route request: {0}")]
    Validation(#[from] ValidationError),
    /// Opening the route database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open the route database: {0}")]
    OpenRoutes(#[from] SqliteRouteStoreError),
    /// Opening the POI catalogue failed.
    #[error("failed to open POI catalogue at {path:?}: {source}")]
    OpenCatalogue {
        /// Catalogue location.
        path: Utf8PathBuf,
        /// Underlying catalogue error.
        #[source]
        source: CatalogueError,
    },
    /// Writing points of interest into the catalogue failed.
    #[error("failed to import POIs into {path:?}: {source}")]
    ImportPois {
        /// Catalogue location.
        path: Utf8PathBuf,
        /// Underlying catalogue error.
        #[source]
        source: CatalogueError,
    },
    /// The OSRM client could not be built.
    #[error("failed to build road router for {base_url}: {source}")]
    BuildRoadRouter {
        /// Configured OSRM base URL.
        base_url: String,
        /// Underlying build error.
        #[source]
        source: ProviderBuildError,
    },
    /// Planning, loading or editing a route failed.
    #[error(transparent)]
    Planner(#[from] PlannerError),
    /// The POI file could not be opened.
    #[error("failed to open POI file {path:?}: {source}")]
    OpenPoiFile {
        /// File location.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The POI file is not a JSON array of points of interest.
    #[error("failed to parse POI file {path:?}: {source}")]
    ParsePoiFile {
        /// File location.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
