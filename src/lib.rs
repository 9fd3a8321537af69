//! Facade crate for the Promenade walking-tour planner.
//!
//! This crate re-exports the core domain types and exposes the SQLite route
//! store and the OSRM and catalogue adapters behind feature flags.

#![forbid(unsafe_code)]

pub use promenade_core::{
    CacheKey, Category, FilterSet, GeometryResolver, GridPoint, PathSelector, PlannerConfig,
    PlannerError, Point, PointOfInterest, ResolutionTier, RoadRouter, RoadRoutingError, Route,
    RouteCache, RouteId, RouteKind, RouteMutator, RouteOrigin, RoutePlanner, RouteRequest,
    RouteStore, SelectorError, StoreError, ValidationError,
};

#[cfg(feature = "store-sqlite")]
pub use promenade_core::{SqliteRouteStore, SqliteRouteStoreError};

#[cfg(feature = "adapters")]
pub use promenade_data::{
    CatalogueConfig, CatalogueError, OsrmRoadRouter, OsrmRoadRouterConfig, ProviderBuildError,
    SqlitePoiCatalogue,
};
