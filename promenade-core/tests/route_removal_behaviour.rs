//! Behavioural tests for copy-on-write POI removal.

use std::cell::{Cell, RefCell};

use promenade_core::{
    Category, FilterSet, NewRoute, PlannerError, Point, PointOfInterest, Route, RouteGeometry,
    RouteId, RouteOrigin, RoutePlanner, RouteRequest, RouteStore,
    test_support::{MemoryRouteStore, StubPathSelector, StubRoadRouter},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const START: Point = Point::new(51.5007, -0.1246);
const RADIUS_M: u32 = 900;

#[derive(Debug)]
struct RemovalWorld {
    store: MemoryRouteStore,
    selector: StubPathSelector,
    router: StubRoadRouter,
    source: Cell<Option<RouteId>>,
    edited: RefCell<Option<Route>>,
    served: RefCell<Option<Route>>,
    error: RefCell<Option<PlannerError>>,
}

impl RemovalWorld {
    fn new() -> Self {
        Self {
            store: MemoryRouteStore::default(),
            selector: StubPathSelector::default(),
            router: StubRoadRouter::echo(),
            source: Cell::new(None),
            edited: RefCell::new(None),
            served: RefCell::new(None),
            error: RefCell::new(None),
        }
    }

    fn planner(&self) -> RoutePlanner<&MemoryRouteStore, &StubPathSelector, &StubRoadRouter> {
        RoutePlanner::new(&self.store, &self.selector, &self.router)
    }

    fn source(&self) -> RouteId {
        self.source.get().expect("a route was stored")
    }

    fn edited(&self) -> Route {
        self.edited.borrow().clone().expect("the removal succeeded")
    }
}

#[fixture]
fn world() -> RemovalWorld {
    RemovalWorld::new()
}

fn park(id: u64, lat: f64, lon: f64) -> PointOfInterest {
    PointOfInterest::with_empty_tags(id, Point::new(lat, lon), Category::Park)
}

fn poi_ids(route: &Route) -> Vec<u64> {
    route.pois.iter().map(|poi| poi.id).collect()
}

#[given("a stored round trip visiting POIs 10, 20 and 30")]
fn given_stored_route(world: &RemovalWorld) {
    let draft = NewRoute {
        origin: RouteOrigin::Round {
            start: START,
            radius_m: RADIUS_M,
        },
        filters: FilterSet::EMPTY.with(Category::Park),
        pois: vec![
            park(10, 51.5010, -0.1200),
            park(20, 51.5030, -0.1180),
            park(30, 51.5050, -0.1220),
        ],
        geometry: RouteGeometry::straight(START, START, 1.4),
        derived_from: None,
    };
    let id = world.store.insert(&draft).expect("seed route");
    world.source.set(Some(id));
}

fn remove(world: &RemovalWorld, poi_id: u64) {
    match world.planner().remove_point(world.source(), poi_id) {
        Ok(route) => {
            world.edited.replace(Some(route));
        }
        Err(err) => {
            world.error.replace(Some(err));
        }
    }
}

#[when("I remove POI 20 from the stored route")]
fn remove_visited(world: &RemovalWorld) {
    remove(world, 20);
}

#[when("I remove POI 99 from the stored route")]
fn remove_unvisited(world: &RemovalWorld) {
    remove(world, 99);
}

#[when("I request the same round trip again")]
fn request_again(world: &RemovalWorld) {
    let request = RouteRequest::round(START, RADIUS_M, FilterSet::EMPTY.with(Category::Park))
        .expect("valid request");
    let route = world.planner().get_route(&request).expect("cached route");
    world.served.replace(Some(route));
}

#[then("a new route visiting POIs 10 and 30 is returned")]
fn then_new_route(world: &RemovalWorld) {
    let edited = world.edited();
    assert_ne!(edited.id, world.source());
    assert_eq!(poi_ids(&edited), vec![10, 30]);
    assert_eq!(edited.name, format!("Route {}", edited.id));
}

#[then("the new route is derived from the stored route")]
fn then_derived(world: &RemovalWorld) {
    let edited = world.edited();
    assert_eq!(edited.derived_from, Some(world.source()));
    assert_eq!(edited.filters, FilterSet::EMPTY.with(Category::Park));
    assert_eq!(
        edited.origin,
        RouteOrigin::Round {
            start: START,
            radius_m: RADIUS_M
        }
    );
}

#[then("the stored route still visits three POIs")]
fn then_source_unchanged(world: &RemovalWorld) {
    let source = world
        .store
        .find_by_id(world.source())
        .expect("load")
        .expect("source exists");
    assert_eq!(poi_ids(&source), vec![10, 20, 30]);
}

#[then("the removal fails as not found")]
fn then_not_found(world: &RemovalWorld) {
    let error = world.error.borrow();
    assert!(matches!(
        error.as_ref(),
        Some(PlannerError::PoiNotInRoute { poi_id: 99, .. })
    ));
    assert!(error.as_ref().is_some_and(PlannerError::is_not_found));
}

#[then("only the stored route exists")]
fn then_nothing_added(world: &RemovalWorld) {
    assert_eq!(world.store.len(), 1);
    assert_eq!(world.router.call_count(), 0);
}

#[then("the original route is served from the cache")]
fn then_original_served(world: &RemovalWorld) {
    let served = world.served.borrow().clone().expect("a route was served");
    assert_eq!(served.id, world.source());
    assert_eq!(served.popularity, 1);
    assert_eq!(world.selector.query_count(), 0);
}

#[scenario(path = "tests/features/route_removal.feature", index = 0)]
fn removal_stores_a_derived_copy(world: RemovalWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_removal.feature", index = 1)]
fn removal_of_unvisited_poi_fails(world: RemovalWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_removal.feature", index = 2)]
fn derived_copy_leaves_cache_untouched(world: RemovalWorld) {
    let _ = world;
}
