//! Adapters connecting the Promenade planner to external systems.
//!
//! Responsibilities:
//! - Resolve walking geometry through an OSRM server ([`routing`]).
//! - Select and order points of interest from a SQLite catalogue
//!   ([`catalogue`]).
//!
//! Boundaries:
//! - Do not encode planning rules (they live in `promenade-core`).
//! - Keep blocking I/O off async executors; the HTTP client is async and is
//!   bridged to the synchronous traits.
//!
//! Invariants:
//! - Thread-safe by default where feasible.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod catalogue;
pub mod routing;

pub use catalogue::{
    CatalogueConfig, CatalogueError, DEFAULT_CORRIDOR_RATIO, DEFAULT_MAX_STOPS,
    SqlitePoiCatalogue, persist_pois_to_sqlite,
};
pub use routing::{OsrmRoadRouter, OsrmRoadRouterConfig, ProviderBuildError};
