//! Coordinate normalisation for cache keys.
//!
//! Coordinates are rounded to three decimal places (roughly 110 m of
//! latitude) so that nearby requests share a cached route. Keys store the
//! rounded value as integer thousandths of a degree, which keeps equality
//! exact where comparing rounded floats would not be.
//!
//! # Examples
//! ```
//! use promenade_core::{GridPoint, Point};
//!
//! let a = GridPoint::from_point(Point::new(55.75149, 37.61731));
//! let b = GridPoint::from_point(Point::new(55.75081, 37.61749));
//! assert_eq!(a, b);
//! assert_eq!(a.to_point(), Point::new(55.751, 37.617));
//! ```

use crate::{FilterSet, Point, RouteKind, RouteOrigin};

/// Grid cells per degree.
pub const GRID_SCALE: f64 = 1_000.0;

/// Round a single coordinate to the cache grid.
///
/// Halves round away from zero.
#[must_use]
pub fn round_coordinate(value: f64) -> f64 {
    (value * GRID_SCALE).round() / GRID_SCALE
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "valid coordinates scale to at most 180_000 in magnitude"
)]
fn to_cell(value: f64) -> i32 {
    (value * GRID_SCALE).round() as i32
}

/// A coordinate snapped to the 0.001° grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPoint {
    /// Latitude in thousandths of a degree.
    pub lat: i32,
    /// Longitude in thousandths of a degree.
    pub lon: i32,
}

impl GridPoint {
    /// Snap `point` to the grid.
    #[must_use]
    pub fn from_point(point: Point) -> Self {
        Self {
            lat: to_cell(point.lat),
            lon: to_cell(point.lon),
        }
    }

    /// The grid cell centre as a [`Point`].
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(
            f64::from(self.lat) / GRID_SCALE,
            f64::from(self.lon) / GRID_SCALE,
        )
    }
}

impl From<Point> for GridPoint {
    fn from(point: Point) -> Self {
        Self::from_point(point)
    }
}

/// Identity of a cached route: normalised endpoints plus request filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Key of a point-to-point route.
    Direct {
        /// Normalised start.
        start: GridPoint,
        /// Normalised finish.
        finish: GridPoint,
        /// Requested categories.
        filters: FilterSet,
    },
    /// Key of a round trip.
    Round {
        /// Normalised start, which is also the finish.
        start: GridPoint,
        /// Search radius in metres.
        radius_m: u32,
        /// Requested categories.
        filters: FilterSet,
    },
}

impl CacheKey {
    /// Derive the key for a route requested from `origin` with `filters`.
    ///
    /// The key depends only on the request, never on the computed route.
    #[must_use]
    pub fn for_origin(origin: &RouteOrigin, filters: FilterSet) -> Self {
        match *origin {
            RouteOrigin::Direct { start, finish } => Self::Direct {
                start: start.into(),
                finish: finish.into(),
                filters,
            },
            RouteOrigin::Round { start, radius_m } => Self::Round {
                start: start.into(),
                radius_m,
                filters,
            },
        }
    }

    /// Kind of route the key identifies.
    #[must_use]
    pub const fn kind(&self) -> RouteKind {
        match self {
            Self::Direct { .. } => RouteKind::Direct,
            Self::Round { .. } => RouteKind::Round,
        }
    }

    /// Filters the key was derived with.
    #[must_use]
    pub const fn filters(&self) -> FilterSet {
        match self {
            Self::Direct { filters, .. } | Self::Round { filters, .. } => *filters,
        }
    }
}
