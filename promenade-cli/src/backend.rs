//! Construction of the storage, catalogue and routing collaborators.
//!
//! Commands receive a [`Backend`] rather than opening databases themselves so
//! tests can substitute in-memory doubles.

use std::time::Duration;

use camino::Utf8Path;
use promenade_core::{PathSelector, RoadRouter, RouteStore};
use promenade_data::{OsrmRoadRouter, OsrmRoadRouterConfig, SqlitePoiCatalogue};

use crate::CliError;

/// Connection settings for the OSRM routing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OsrmSettings {
    pub(crate) base_url: String,
    pub(crate) timeout_secs: u64,
}

/// Opens the collaborators a command needs.
pub(crate) trait Backend {
    fn route_store(&self, routes_db: &Utf8Path) -> Result<Box<dyn RouteStore>, CliError>;
    fn path_selector(&self, pois_db: &Utf8Path) -> Result<Box<dyn PathSelector>, CliError>;
    fn road_router(&self, osrm: &OsrmSettings) -> Result<Box<dyn RoadRouter>, CliError>;
}

/// SQLite route cache, SQLite POI catalogue and an OSRM server.
pub(crate) struct SqliteOsrmBackend;

impl Backend for SqliteOsrmBackend {
    #[cfg(feature = "store-sqlite")]
    fn route_store(&self, routes_db: &Utf8Path) -> Result<Box<dyn RouteStore>, CliError> {
        let store = promenade_core::SqliteRouteStore::open(routes_db.as_std_path())?;
        Ok(Box::new(store))
    }

    #[cfg(not(feature = "store-sqlite"))]
    fn route_store(&self, _routes_db: &Utf8Path) -> Result<Box<dyn RouteStore>, CliError> {
        Err(CliError::MissingFeature {
            feature: "store-sqlite",
            action: "Opening the route database",
        })
    }

    fn path_selector(&self, pois_db: &Utf8Path) -> Result<Box<dyn PathSelector>, CliError> {
        let catalogue = SqlitePoiCatalogue::open(pois_db.as_std_path()).map_err(|source| {
            CliError::OpenCatalogue {
                path: pois_db.to_path_buf(),
                source,
            }
        })?;
        Ok(Box::new(catalogue))
    }

    fn road_router(&self, osrm: &OsrmSettings) -> Result<Box<dyn RoadRouter>, CliError> {
        let config = OsrmRoadRouterConfig::new(osrm.base_url.clone())
            .with_timeout(Duration::from_secs(osrm.timeout_secs));
        let router = OsrmRoadRouter::with_config(config).map_err(|source| {
            CliError::BuildRoadRouter {
                base_url: osrm.base_url.clone(),
                source,
            }
        })?;
        Ok(Box::new(router))
    }
}
