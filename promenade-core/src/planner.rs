//! Route planning: serve from the cache or compute, persist and name.
//!
//! [`RoutePlanner`] owns the request pipeline. A request is answered from the
//! [`RouteCache`] when a route with the same normalised key exists. Otherwise
//! points of interest are selected through the [`PathSelector`], the walk is
//! resolved by the [`GeometryResolver`], and the result is persisted and
//! named before it is returned.
//!
//! # Examples
//! ```
//! use promenade_core::test_support::{MemoryRouteStore, StubPathSelector, StubRoadRouter};
//! use promenade_core::{FilterSet, Point, RoutePlanner, RouteRequest};
//!
//! let planner = RoutePlanner::new(
//!     MemoryRouteStore::default(),
//!     StubPathSelector::default(),
//!     StubRoadRouter::echo(),
//! );
//! let request = RouteRequest::direct(
//!     Point::new(55.7558, 37.6173),
//!     Point::new(55.7494, 37.6130),
//!     FilterSet::EMPTY,
//! )?;
//!
//! let first = planner.get_route(&request)?;
//! let again = planner.get_route(&request)?;
//! assert_eq!(first.id, again.id);
//! assert_eq!(again.popularity, 1);
//! # Ok::<(), promenade_core::PlannerError>(())
//! ```

use std::sync::Arc;

use geo::{Coord, Rect};
use log::{debug, info};
use thiserror::Error;

use crate::{
    FilterSet, GeometryConfig, GeometryError, GeometryResolver, NewRoute, PathSelector, Point,
    PointOfInterest, RoadRouter, Route, RouteCache, RouteId, RouteMutator, RouteOrigin,
    RouteRequest, RouteStore, SelectorError, StoreError, ValidationError, WALKING_SPEED_MPS,
};

/// Metres spanned by one degree of latitude.
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// Default number of candidates sampled for a round trip.
pub const DEFAULT_ROUND_SAMPLE_SIZE: usize = 100;

/// Failures of the planning operations.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The request was malformed. Nothing was computed or stored.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No route has the requested id.
    #[error("route {route_id} was not found")]
    NotFound {
        /// Identifier that matched nothing.
        route_id: RouteId,
    },
    /// The route exists but does not visit the POI.
    #[error("route {route_id} does not visit point of interest {poi_id}")]
    PoiNotInRoute {
        /// Route that was searched.
        route_id: RouteId,
        /// POI that was not found in it.
        poi_id: u64,
    },
    /// Candidate points of interest could not be queried.
    #[error(transparent)]
    Selection(#[from] SelectorError),
    /// Reading or writing routes failed.
    #[error("route storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl PlannerError {
    /// Report whether the error means "no such route or POI".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::PoiNotInRoute { .. })
    }
}

impl From<GeometryError> for PlannerError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::TooFewWaypoints { count } => {
                Self::Validation(ValidationError::TooFewWaypoints { count })
            }
        }
    }
}

/// Chooses display names for newly stored routes.
pub trait RouteNamer: Send + Sync {
    /// Name for `route`, which already has its identifier.
    fn name(&self, route: &Route) -> String;
}

/// Names routes `Route {id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialNamer;

impl RouteNamer for SequentialNamer {
    fn name(&self, route: &Route) -> String {
        format!("Route {}", route.id)
    }
}

/// Tunables for [`RoutePlanner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    /// How many candidates to sample for a round trip.
    pub round_sample_size: usize,
    /// Speed used for straight-line estimates, in metres per second.
    pub walking_speed_mps: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            round_sample_size: DEFAULT_ROUND_SAMPLE_SIZE,
            walking_speed_mps: WALKING_SPEED_MPS,
        }
    }
}

impl PlannerConfig {
    /// Set the round-trip sample size.
    #[must_use]
    pub const fn with_round_sample_size(mut self, size: usize) -> Self {
        self.round_sample_size = size;
        self
    }

    /// Set the walking speed used for straight-line estimates.
    #[must_use]
    pub const fn with_walking_speed(mut self, speed_mps: f64) -> Self {
        self.walking_speed_mps = speed_mps;
        self
    }
}

/// The route computation and caching pipeline.
pub struct RoutePlanner<S, P, R> {
    cache: RouteCache<S>,
    selector: P,
    resolver: GeometryResolver<R>,
    namer: Arc<dyn RouteNamer>,
    config: PlannerConfig,
}

impl<S, P, R> std::fmt::Debug for RoutePlanner<S, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutePlanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, P, R> RoutePlanner<S, P, R>
where
    S: RouteStore,
    P: PathSelector,
    R: RoadRouter,
{
    /// Create a planner with default configuration and naming.
    pub fn new(store: S, selector: P, router: R) -> Self {
        Self::with_config(store, selector, router, PlannerConfig::default())
    }

    /// Create a planner with explicit configuration.
    pub fn with_config(store: S, selector: P, router: R, config: PlannerConfig) -> Self {
        let geometry = GeometryConfig {
            walking_speed_mps: config.walking_speed_mps,
        };
        Self {
            cache: RouteCache::new(store),
            selector,
            resolver: GeometryResolver::with_config(router, geometry),
            namer: Arc::new(SequentialNamer),
            config,
        }
    }

    /// Replace the naming policy.
    #[must_use]
    pub fn with_namer(mut self, namer: impl RouteNamer + 'static) -> Self {
        self.namer = Arc::new(namer);
        self
    }

    /// The active configuration.
    pub const fn config(&self) -> PlannerConfig {
        self.config
    }

    /// Serve `request` from the cache or compute a new route.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Selection`] when candidate POIs cannot be
    /// queried and [`PlannerError::Storage`] when the lookup or the insert
    /// fails. Routing failures never surface; they degrade the geometry.
    pub fn get_route(&self, request: &RouteRequest) -> Result<Route, PlannerError> {
        if let Some(route) = self.cache.lookup(&request.cache_key())? {
            return Ok(route);
        }

        let pois = self.select_pois(&request.origin, request.filters)?;
        let geometry = self
            .resolver
            .resolve_origin(&request.origin, pois.iter().map(|poi| poi.location))?;
        debug!(
            "resolved {} route through {} stops using {:?}",
            request.origin.kind(),
            pois.len(),
            geometry.tiers
        );

        let draft = NewRoute {
            origin: request.origin,
            filters: request.filters,
            pois,
            geometry,
            derived_from: None,
        };
        Ok(self.cache.persist(draft, self.namer.as_ref())?)
    }

    /// Load the stored route with `id`. Popularity is not affected.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::NotFound`] for unknown ids and
    /// [`PlannerError::Storage`] when the read fails.
    pub fn get_route_by_id(&self, id: RouteId) -> Result<Route, PlannerError> {
        self.cache
            .load(id)?
            .ok_or(PlannerError::NotFound { route_id: id })
    }

    /// Store a copy of route `route_id` without POI `poi_id`.
    ///
    /// See [`RouteMutator::remove_point`].
    ///
    /// # Errors
    ///
    /// As [`RouteMutator::remove_point`].
    pub fn remove_point(&self, route_id: RouteId, poi_id: u64) -> Result<Route, PlannerError> {
        self.mutator().remove_point(route_id, poi_id)
    }

    /// A mutator sharing this planner's store, router and naming policy.
    pub fn mutator(&self) -> RouteMutator<&S, &R> {
        RouteMutator::from_parts(
            RouteCache::new(self.cache.store()),
            GeometryResolver::with_config(self.resolver.router(), self.resolver.config()),
            Arc::clone(&self.namer),
        )
    }

    fn select_pois(
        &self,
        origin: &RouteOrigin,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, PlannerError> {
        let pois = match *origin {
            RouteOrigin::Direct { start, finish } => {
                let bbox = Rect::new(Coord::from(start), Coord::from(finish));
                let candidates = self.selector.candidates_in_box(&bbox, filters)?;
                debug!("{} candidates between {start} and {finish}", candidates.len());
                self.selector.order_for_direct_path(start, finish, candidates)
            }
            RouteOrigin::Round { start, radius_m } => {
                let bbox = bounding_box(start, radius_m);
                let candidates =
                    self.selector
                        .random_sample(&bbox, self.config.round_sample_size, filters)?;
                debug!(
                    "{} candidates sampled within {radius_m} m of {start}",
                    candidates.len()
                );
                self.selector.order_for_round_path(start, radius_m, candidates)
            }
        };
        info!("selected {} stops for {} route", pois.len(), origin.kind());
        Ok(pois)
    }
}

/// Square box reaching `radius_m` metres from `center` along both axes.
///
/// Longitude degrees shrink with latitude, so the east-west offset is scaled
/// by `1 / cos(lat)`. The box is clamped to valid coordinate ranges.
///
/// # Examples
/// ```
/// use promenade_core::{Point, bounding_box};
///
/// let bbox = bounding_box(Point::new(0.0, 0.0), 111_320);
/// assert!((bbox.max().y - 1.0).abs() < 1e-9);
/// assert!((bbox.min().x + 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn bounding_box(center: Point, radius_m: u32) -> Rect<f64> {
    let lat_offset = f64::from(radius_m) / METRES_PER_DEGREE;
    let lon_scale = center.lat.to_radians().cos().max(f64::EPSILON);
    let lon_offset = lat_offset / lon_scale;

    let min = Coord {
        x: (center.lon - lon_offset).max(-180.0),
        y: (center.lat - lat_offset).max(-90.0),
    };
    let max = Coord {
        x: (center.lon + lon_offset).min(180.0),
        y: (center.lat + lat_offset).min(90.0),
    };
    Rect::new(min, max)
}
