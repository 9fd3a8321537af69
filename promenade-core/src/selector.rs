//! Choosing and ordering the points of interest a tour visits.
//!
//! The `PathSelector` trait is the seam for the POI heuristic. Bounding boxes
//! are [`geo::Rect`] values in WGS84 with `x = longitude` and `y = latitude`,
//! matching the rest of the `geo` ecosystem.

use std::sync::Arc;

use geo::Rect;
use thiserror::Error;

use crate::{FilterSet, Point, PointOfInterest};

/// Errors raised while querying candidate points of interest.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// The backing catalogue query failed.
    #[error("point of interest query failed: {source}")]
    Query {
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SelectorError {
    /// Wrap a backend failure.
    pub fn query(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Query {
            source: source.into(),
        }
    }
}

/// Select and order points of interest for a tour.
///
/// The two query methods return unordered candidates. The two ordering
/// methods pick a subsequence of those candidates and return it in visiting
/// order; they never introduce POIs that were not supplied.
pub trait PathSelector {
    /// Every POI inside `bbox` whose category passes `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] when the backing query fails.
    fn candidates_in_box(
        &self,
        bbox: &Rect<f64>,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError>;

    /// Up to `max_count` POIs inside `bbox` passing `filters`, chosen at
    /// random.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] when the backing query fails.
    fn random_sample(
        &self,
        bbox: &Rect<f64>,
        max_count: usize,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError>;

    /// Order candidates for a walk from `start` to `finish`.
    fn order_for_direct_path(
        &self,
        start: Point,
        finish: Point,
        candidates: Vec<PointOfInterest>,
    ) -> Vec<PointOfInterest>;

    /// Order candidates for a loop around `center` within `radius_m` metres.
    fn order_for_round_path(
        &self,
        center: Point,
        radius_m: u32,
        candidates: Vec<PointOfInterest>,
    ) -> Vec<PointOfInterest>;
}

macro_rules! forward_path_selector {
    ($($wrapper:ty),+) => {$(
        impl<T: PathSelector + ?Sized> PathSelector for $wrapper {
            fn candidates_in_box(
                &self,
                bbox: &Rect<f64>,
                filters: FilterSet,
            ) -> Result<Vec<PointOfInterest>, SelectorError> {
                (**self).candidates_in_box(bbox, filters)
            }

            fn random_sample(
                &self,
                bbox: &Rect<f64>,
                max_count: usize,
                filters: FilterSet,
            ) -> Result<Vec<PointOfInterest>, SelectorError> {
                (**self).random_sample(bbox, max_count, filters)
            }

            fn order_for_direct_path(
                &self,
                start: Point,
                finish: Point,
                candidates: Vec<PointOfInterest>,
            ) -> Vec<PointOfInterest> {
                (**self).order_for_direct_path(start, finish, candidates)
            }

            fn order_for_round_path(
                &self,
                center: Point,
                radius_m: u32,
                candidates: Vec<PointOfInterest>,
            ) -> Vec<PointOfInterest> {
                (**self).order_for_round_path(center, radius_m, candidates)
            }
        }
    )+};
}

forward_path_selector!(&T, Arc<T>, Box<T>);

/// Report whether `point` lies inside `bbox`, edges included.
#[must_use]
pub fn rect_contains(bbox: &Rect<f64>, point: Point) -> bool {
    let min = bbox.min();
    let max = bbox.max();
    (min.y..=max.y).contains(&point.lat) && (min.x..=max.x).contains(&point.lon)
}
