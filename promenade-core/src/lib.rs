//! Core domain for the Promenade walking-tour planner.
//!
//! The crate computes pedestrian tours, either point to point or as a loop
//! around a start, through selected points of interest. Computed routes are
//! cached under a normalised key so nearby requests share them, and routes
//! can be edited copy-on-write.
//!
//! External collaborators sit behind traits: [`RoadRouter`] resolves walking
//! geometry, [`PathSelector`] chooses and orders points of interest, and
//! [`RouteStore`] persists routes. [`RoutePlanner`] and [`RouteMutator`]
//! drive them.

#![forbid(unsafe_code)]

pub mod cache;
pub mod filter;
pub mod geometry;
pub mod mutator;
pub mod normalize;
pub mod planner;
pub mod poi;
pub mod point;
pub mod request;
pub mod road_routing;
pub mod route;
pub mod selector;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cache::RouteCache;
pub use filter::{Category, FilterSet, ParseCategoryError};
pub use geometry::{
    GeometryConfig, GeometryError, GeometryResolver, ResolutionTier, RouteGeometry,
    WALKING_SPEED_MPS,
};
pub use mutator::RouteMutator;
pub use normalize::{CacheKey, GRID_SCALE, GridPoint, round_coordinate};
pub use planner::{
    DEFAULT_ROUND_SAMPLE_SIZE, METRES_PER_DEGREE, PlannerConfig, PlannerError, RouteNamer,
    RoutePlanner, SequentialNamer, bounding_box,
};
pub use poi::{PointOfInterest, Tags};
pub use point::Point;
pub use request::{RouteRequest, ValidationError};
pub use road_routing::{RoadPath, RoadResponse, RoadRouter, RoadRoutingError, STATUS_OK};
pub use route::{Route, RouteId, RouteKind, RouteOrigin};
pub use selector::{PathSelector, SelectorError, rect_contains};
pub use store::{BoxError, NewRoute, RouteStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::{SCHEMA_VERSION, SqliteRouteStore, SqliteRouteStoreError};
