//! Test doubles and fixtures shared by the CLI tests.

use std::cell::RefCell;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use promenade_core::test_support::{MemoryRouteStore, StubPathSelector, StubRoadRouter};
use promenade_core::{Category, PathSelector, Point, PointOfInterest, RoadRouter, RouteStore};
use tempfile::TempDir;

use crate::CliError;
use crate::backend::{Backend, OsrmSettings};

pub(super) const DIRECT_START: Point = Point::new(55.7558, 37.6173);
pub(super) const DIRECT_FINISH: Point = Point::new(55.7494, 37.6130);

/// Backend over in-memory doubles that records what was opened.
#[derive(Debug)]
pub(super) struct StubBackend {
    pub(super) store: Arc<MemoryRouteStore>,
    pub(super) selector: Arc<StubPathSelector>,
    pub(super) router: Arc<StubRoadRouter>,
    opened: RefCell<Vec<String>>,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::with_pois(Vec::new())
    }
}

impl StubBackend {
    pub(super) fn with_pois(pois: Vec<PointOfInterest>) -> Self {
        Self {
            store: Arc::new(MemoryRouteStore::default()),
            selector: Arc::new(StubPathSelector::with_pois(pois)),
            router: Arc::new(StubRoadRouter::echo()),
            opened: RefCell::new(Vec::new()),
        }
    }

    /// Every database path and router URL handed out, in order.
    pub(super) fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl Backend for StubBackend {
    fn route_store(&self, routes_db: &Utf8Path) -> Result<Box<dyn RouteStore>, CliError> {
        self.opened.borrow_mut().push(routes_db.to_string());
        Ok(Box::new(Arc::clone(&self.store)))
    }

    fn path_selector(&self, pois_db: &Utf8Path) -> Result<Box<dyn PathSelector>, CliError> {
        self.opened.borrow_mut().push(pois_db.to_string());
        Ok(Box::new(Arc::clone(&self.selector)))
    }

    fn road_router(&self, osrm: &OsrmSettings) -> Result<Box<dyn RoadRouter>, CliError> {
        self.opened.borrow_mut().push(osrm.base_url.clone());
        Ok(Box::new(Arc::clone(&self.router)))
    }
}

/// Two museums between the direct walk's endpoints.
pub(super) fn kremlin_museums() -> Vec<PointOfInterest> {
    vec![
        PointOfInterest::with_empty_tags(1, Point::new(55.7530, 37.6150), Category::Museum),
        PointOfInterest::with_empty_tags(2, Point::new(55.7510, 37.6140), Category::Museum),
    ]
}

/// `--point` value for `point`.
pub(super) fn point_arg(point: Point) -> String {
    format!("{},{}", point.lat, point.lon)
}

pub(super) fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}
