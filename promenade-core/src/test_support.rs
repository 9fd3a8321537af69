//! Deterministic test doubles for the routing, selection and storage seams.
//!
//! Shared by unit tests, behaviour tests and the other workspace crates.
//! Every double records how it was called so tests can assert on side
//! effects as well as results. Available under `cfg(test)` and the
//! `test-support` feature.

use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use geo::Rect;

use crate::{
    CacheKey, FilterSet, NewRoute, PathSelector, Point, PointOfInterest, RoadPath, RoadResponse,
    RoadRouter, RoadRoutingError, Route, RouteId, RouteStore, SelectorError, StoreError,
    rect_contains,
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A network failure suitable for scripting router outages.
#[must_use]
pub fn network_error() -> RoadRoutingError {
    RoadRoutingError::Network {
        url: "http://osrm.test".to_owned(),
        message: "connection refused".to_owned(),
    }
}

#[derive(Debug, Clone)]
enum StubRouting {
    Echo,
    Fail(RoadRoutingError),
    PairwiseOnly,
}

/// Stub `RoadRouter` for testing.
///
/// In echo mode every request succeeds with a path whose polyline is the
/// waypoints themselves and whose distance is the straight-line length.
/// Individual waypoint lists can be scripted to fail.
///
/// # Example
///
/// ```
/// use promenade_core::test_support::StubRoadRouter;
/// use promenade_core::{Point, RoadRouter};
///
/// let router = StubRoadRouter::echo();
/// let waypoints = [Point::new(0.0, 0.0), Point::new(0.0, 0.01)];
/// let response = router.route(&waypoints)?;
///
/// assert!(response.is_ok());
/// assert_eq!(router.calls(), vec![waypoints.to_vec()]);
/// # Ok::<(), promenade_core::RoadRoutingError>(())
/// ```
#[derive(Debug)]
pub struct StubRoadRouter {
    mode: StubRouting,
    failing_requests: Vec<Vec<Point>>,
    duration_s: Option<f64>,
    snapping: Option<(Point, Point)>,
    calls: Mutex<Vec<Vec<Point>>>,
}

impl StubRoadRouter {
    fn with_mode(mode: StubRouting) -> Self {
        Self {
            mode,
            failing_requests: Vec::new(),
            duration_s: None,
            snapping: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A router that answers every request.
    #[must_use]
    pub fn echo() -> Self {
        Self::with_mode(StubRouting::Echo)
    }

    /// A router that fails every request with `error`.
    #[must_use]
    pub fn failing(error: RoadRoutingError) -> Self {
        Self::with_mode(StubRouting::Fail(error))
    }

    /// A router that only answers requests with exactly two waypoints.
    #[must_use]
    pub fn pairwise_only() -> Self {
        Self::with_mode(StubRouting::PairwiseOnly)
    }

    /// Fail requests whose waypoints equal `waypoints`.
    #[must_use]
    pub fn fail_when_routing(mut self, waypoints: Vec<Point>) -> Self {
        self.failing_requests.push(waypoints);
        self
    }

    /// Report `duration_s` for every path instead of a walking estimate.
    #[must_use]
    pub const fn with_duration(mut self, duration_s: f64) -> Self {
        self.duration_s = Some(duration_s);
        self
    }

    /// Replace the first and last polyline points, imitating a router that
    /// snaps endpoints onto the road network.
    #[must_use]
    pub const fn with_snapping(mut self, first: Point, last: Point) -> Self {
        self.snapping = Some((first, last));
        self
    }

    /// Waypoint lists received so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Point>> {
        locked(&self.calls).clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }

    fn echo_path(&self, waypoints: &[Point]) -> RoadPath {
        let distance_m: f64 = waypoints
            .windows(2)
            .map(|pair| match *pair {
                [from, to] => from.haversine_m(to),
                _ => 0.0,
            })
            .sum();
        let mut points = waypoints.to_vec();
        if let Some((first, last)) = self.snapping {
            if let Some(head) = points.first_mut() {
                *head = first;
            }
            if let Some(tail) = points.last_mut() {
                *tail = last;
            }
        }
        RoadPath {
            distance_m,
            duration_s: self
                .duration_s
                .unwrap_or(distance_m / crate::WALKING_SPEED_MPS),
            coordinates: points.into_iter().map(Point::to_lon_lat).collect(),
        }
    }
}

impl RoadRouter for StubRoadRouter {
    fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError> {
        locked(&self.calls).push(waypoints.to_vec());
        if waypoints.len() < 2 {
            return Err(RoadRoutingError::EmptyInput {
                count: waypoints.len(),
            });
        }
        if self
            .failing_requests
            .iter()
            .any(|failing| failing.as_slice() == waypoints)
        {
            return Err(network_error());
        }
        match &self.mode {
            StubRouting::Fail(error) => Err(error.clone()),
            StubRouting::PairwiseOnly if waypoints.len() > 2 => Ok(RoadResponse {
                code: "TooBig".to_owned(),
                message: Some("too many waypoints".to_owned()),
                paths: Vec::new(),
            }),
            StubRouting::Echo | StubRouting::PairwiseOnly => {
                Ok(RoadResponse::ok(vec![self.echo_path(waypoints)]))
            }
        }
    }
}

/// In-memory `PathSelector` that records its queries.
///
/// Queries filter the configured POIs by box and category; ordering keeps
/// candidates in the order they were supplied.
#[derive(Debug, Default)]
pub struct StubPathSelector {
    pois: Vec<PointOfInterest>,
    fail: bool,
    boxes: Mutex<Vec<Rect<f64>>>,
    sample_sizes: Mutex<Vec<usize>>,
}

impl StubPathSelector {
    /// A selector over `pois`.
    #[must_use]
    pub fn with_pois<I>(pois: I) -> Self
    where
        I: IntoIterator<Item = PointOfInterest>,
    {
        Self {
            pois: pois.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A selector whose queries always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Boxes passed to either query, in call order.
    #[must_use]
    pub fn boxes(&self) -> Vec<Rect<f64>> {
        locked(&self.boxes).clone()
    }

    /// `max_count` values passed to `random_sample`, in call order.
    #[must_use]
    pub fn sample_sizes(&self) -> Vec<usize> {
        locked(&self.sample_sizes).clone()
    }

    /// Number of queries received so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        locked(&self.boxes).len()
    }

    fn query(
        &self,
        bbox: &Rect<f64>,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError> {
        locked(&self.boxes).push(*bbox);
        if self.fail {
            return Err(SelectorError::query("catalogue unavailable"));
        }
        Ok(self
            .pois
            .iter()
            .filter(|poi| rect_contains(bbox, poi.location) && filters.matches(poi.category))
            .cloned()
            .collect())
    }
}

impl PathSelector for StubPathSelector {
    fn candidates_in_box(
        &self,
        bbox: &Rect<f64>,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError> {
        self.query(bbox, filters)
    }

    fn random_sample(
        &self,
        bbox: &Rect<f64>,
        max_count: usize,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError> {
        locked(&self.sample_sizes).push(max_count);
        let mut candidates = self.query(bbox, filters)?;
        candidates.truncate(max_count);
        Ok(candidates)
    }

    fn order_for_direct_path(
        &self,
        _start: Point,
        _finish: Point,
        candidates: Vec<PointOfInterest>,
    ) -> Vec<PointOfInterest> {
        candidates
    }

    fn order_for_round_path(
        &self,
        _center: Point,
        _radius_m: u32,
        candidates: Vec<PointOfInterest>,
    ) -> Vec<PointOfInterest> {
        candidates
    }
}

/// In-memory `RouteStore` with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryRouteStore {
    routes: Mutex<Vec<(CacheKey, Route)>>,
    fail_inserts: AtomicBool,
    fail_lookups: AtomicBool,
    fail_popularity: AtomicBool,
    fail_names: AtomicBool,
}

impl MemoryRouteStore {
    /// Make `insert` fail.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make `find_by_key` and `find_by_id` fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make `increment_popularity` fail.
    pub fn fail_popularity_updates(&self, fail: bool) {
        self.fail_popularity.store(fail, Ordering::SeqCst);
    }

    /// Make `update_name` fail.
    pub fn fail_name_updates(&self, fail: bool) {
        self.fail_names.store(fail, Ordering::SeqCst);
    }

    /// Number of stored routes.
    #[must_use]
    pub fn len(&self) -> usize {
        locked(&self.routes).len()
    }

    /// Report whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        locked(&self.routes).is_empty()
    }

    /// Every stored route, in insertion order.
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        locked(&self.routes)
            .iter()
            .map(|(_, route)| route.clone())
            .collect()
    }

    fn injected(flag: &AtomicBool, operation: &'static str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::query(operation, "injected failure"))
        } else {
            Ok(())
        }
    }

    fn update(&self, id: RouteId, apply: impl FnOnce(&mut Route)) -> Result<(), StoreError> {
        let mut routes = locked(&self.routes);
        let (_, route) = routes
            .iter_mut()
            .find(|(_, route)| route.id == id)
            .ok_or(StoreError::Missing { id })?;
        apply(route);
        Ok(())
    }
}

impl RouteStore for MemoryRouteStore {
    fn insert(&self, route: &NewRoute) -> Result<RouteId, StoreError> {
        Self::injected(&self.fail_inserts, "insert route")?;
        let mut routes = locked(&self.routes);
        let next = routes
            .last()
            .map_or(1, |(_, stored)| stored.id.get().saturating_add(1));
        let id = RouteId::new(next);
        routes.push((route.cache_key(), route.clone().into_route(id)));
        Ok(id)
    }

    fn find_by_id(&self, id: RouteId) -> Result<Option<Route>, StoreError> {
        Self::injected(&self.fail_lookups, "load route by id")?;
        Ok(locked(&self.routes)
            .iter()
            .find(|(_, route)| route.id == id)
            .map(|(_, route)| route.clone()))
    }

    fn find_by_key(&self, key: &CacheKey) -> Result<Option<Route>, StoreError> {
        Self::injected(&self.fail_lookups, "look up route by key")?;
        Ok(locked(&self.routes)
            .iter()
            .filter(|(stored_key, route)| stored_key == key && route.derived_from.is_none())
            .min_by_key(|(_, route)| route.id)
            .map(|(_, route)| route.clone()))
    }

    fn increment_popularity(&self, id: RouteId) -> Result<(), StoreError> {
        Self::injected(&self.fail_popularity, "increment route popularity")?;
        self.update(id, |route| route.popularity = route.popularity.saturating_add(1))
    }

    fn update_name(&self, id: RouteId, name: &str) -> Result<(), StoreError> {
        Self::injected(&self.fail_names, "rename route")?;
        self.update(id, |route| name.clone_into(&mut route.name))
    }
}
