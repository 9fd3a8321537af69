//! Behavioural tests for `OsrmRoadRouter` using rstest-bdd.
//!
//! The router points at a local port with no listener, so no test depends
//! on a running OSRM service.

use std::{cell::RefCell, time::Duration};

use promenade_core::{
    GeometryResolver, Point, ResolutionTier, RoadResponse, RoadRouter, RoadRoutingError,
    RouteGeometry,
};
use promenade_data::{OsrmRoadRouter, OsrmRoadRouterConfig};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Result cell holding the outcome of a routing request.
type ResultCell = RefCell<Option<Result<RoadResponse, RoadRoutingError>>>;

#[derive(Debug, Default)]
struct RouterWorld {
    router: RefCell<Option<OsrmRoadRouter>>,
    result: ResultCell,
    geometry: RefCell<Option<RouteGeometry>>,
}

impl RouterWorld {
    fn with_router<T>(&self, f: impl FnOnce(&OsrmRoadRouter) -> T) -> T {
        let borrowed = self.router.borrow();
        f(borrowed.as_ref().expect("router must be initialised"))
    }
}

#[fixture]
fn world() -> RouterWorld {
    RouterWorld::default()
}

fn waypoints(count: usize) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let step = f64::from(u32::try_from(i).unwrap_or(0)) * 0.005;
            Point::new(51.5 + step, -0.12 + step)
        })
        .collect()
}

#[given("an OSRM router pointing at a closed local port")]
fn given_unreachable_router(world: &RouterWorld) {
    let config = OsrmRoadRouterConfig::new("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(2))
        .with_user_agent("promenade-tests/0.1");
    let router = OsrmRoadRouter::with_config(config).expect("router should build");
    world.router.replace(Some(router));
}

#[when("I route between two waypoints")]
fn route_two(world: &RouterWorld) {
    let result = world.with_router(|router| router.route(&waypoints(2)));
    world.result.replace(Some(result));
}

#[when("I route through a single waypoint")]
fn route_one(world: &RouterWorld) {
    let result = world.with_router(|router| router.route(&waypoints(1)));
    world.result.replace(Some(result));
}

#[when("I resolve a walk through three waypoints")]
fn resolve_three(world: &RouterWorld) {
    let geometry = world.with_router(|router| {
        GeometryResolver::new(router)
            .resolve(&waypoints(3))
            .expect("resolution never fails for three waypoints")
    });
    world.geometry.replace(Some(geometry));
}

#[then("a network or timeout error is returned")]
fn then_network_error(world: &RouterWorld) {
    let borrowed = world.result.borrow();
    assert!(
        matches!(
            borrowed.as_ref(),
            Some(Err(
                RoadRoutingError::Network { .. } | RoadRoutingError::Timeout { .. }
            ))
        ),
        "expected a network failure, got {borrowed:?}"
    );
}

#[then("an empty input error is returned")]
fn then_empty_input(world: &RouterWorld) {
    let borrowed = world.result.borrow();
    assert!(
        matches!(
            borrowed.as_ref(),
            Some(Err(RoadRoutingError::EmptyInput { count: 1 }))
        ),
        "expected EmptyInput error, got {borrowed:?}"
    );
}

#[then("every leg is a straight line")]
fn then_straight_lines(world: &RouterWorld) {
    let borrowed = world.geometry.borrow();
    let geometry = borrowed.as_ref().expect("geometry resolved");
    assert_eq!(
        geometry.tiers,
        vec![ResolutionTier::StraightLine, ResolutionTier::StraightLine]
    );
    assert_eq!(geometry.points, waypoints(3));
}

#[then("the walk has a positive duration")]
fn then_positive_duration(world: &RouterWorld) {
    let borrowed = world.geometry.borrow();
    let geometry = borrowed.as_ref().expect("geometry resolved");
    assert!(geometry.length_m > 0.0);
    assert!(geometry.duration_s > 0);
}

#[scenario(path = "tests/features/osrm_road_router.feature", index = 0)]
fn unreachable_server_is_a_network_failure(world: RouterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/osrm_road_router.feature", index = 1)]
fn resolver_degrades_to_straight_lines(world: RouterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/osrm_road_router.feature", index = 2)]
fn single_waypoint_is_rejected(world: RouterWorld) {
    let _ = world;
}
