//! Computed tour routes and the request origin they were built from.

use std::str::FromStr;

use crate::{FilterSet, Point, PointOfInterest, ValidationError};

/// Storage identifier of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RouteId(i64);

impl RouteId {
    /// Wrap a raw storage identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw storage identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RouteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Shape of a tour.
///
/// # Examples
/// ```
/// use promenade_core::RouteKind;
///
/// assert_eq!("round".parse::<RouteKind>()?, RouteKind::Round);
/// assert_eq!(RouteKind::Direct.to_string(), "direct");
/// # Ok::<(), promenade_core::ValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum RouteKind {
    /// From a start point to a different finish point.
    Direct,
    /// A loop that returns to its start.
    Round,
}

impl RouteKind {
    /// Return the kind as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Round => "round",
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "round" => Ok(Self::Round),
            _ => Err(ValidationError::UnsupportedRouteKind { kind: s.to_owned() }),
        }
    }
}

/// The endpoints a route was requested with, exactly as supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "lowercase")
)]
pub enum RouteOrigin {
    /// A point-to-point request.
    Direct {
        /// Where the walk starts.
        start: Point,
        /// Where the walk ends.
        finish: Point,
    },
    /// A round-trip request.
    Round {
        /// Where the walk starts and ends.
        start: Point,
        /// How far from `start` points of interest may lie, in metres.
        radius_m: u32,
    },
}

impl RouteOrigin {
    /// Kind of route this origin describes.
    #[must_use]
    pub const fn kind(&self) -> RouteKind {
        match self {
            Self::Direct { .. } => RouteKind::Direct,
            Self::Round { .. } => RouteKind::Round,
        }
    }

    /// Where the walk starts.
    #[must_use]
    pub const fn start(&self) -> Point {
        match self {
            Self::Direct { start, .. } | Self::Round { start, .. } => *start,
        }
    }

    /// Where the walk ends; the start for round trips.
    #[must_use]
    pub const fn finish(&self) -> Point {
        match self {
            Self::Direct { finish, .. } => *finish,
            Self::Round { start, .. } => *start,
        }
    }

    /// Frame `stops` with the origin's endpoints to form the waypoint list.
    ///
    /// # Examples
    /// ```
    /// use promenade_core::{Point, RouteOrigin};
    ///
    /// let start = Point::new(1.0, 1.0);
    /// let origin = RouteOrigin::Round { start, radius_m: 300 };
    /// let stop = Point::new(1.001, 1.001);
    /// assert_eq!(origin.waypoints([stop]), vec![start, stop, start]);
    /// ```
    #[must_use]
    pub fn waypoints<I>(&self, stops: I) -> Vec<Point>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut waypoints = vec![self.start()];
        waypoints.extend(stops);
        waypoints.push(self.finish());
        waypoints
    }
}

/// A persisted walking tour.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Storage identifier.
    pub id: RouteId,
    /// Endpoints the route was requested with.
    pub origin: RouteOrigin,
    /// Points of interest in the order they are visited.
    pub pois: Vec<PointOfInterest>,
    /// Walking polyline from start to finish.
    pub points: Vec<Point>,
    /// Walking distance in metres.
    pub length_m: f64,
    /// Walking time in seconds.
    pub duration_s: u64,
    /// Display name.
    pub name: String,
    /// Categories the route was requested with.
    pub filters: FilterSet,
    /// How often the route was served from the cache.
    pub popularity: u64,
    /// The route this one was edited from, if any.
    pub derived_from: Option<RouteId>,
}

impl Route {
    /// Kind of the route.
    #[must_use]
    pub const fn kind(&self) -> RouteKind {
        self.origin.kind()
    }

    /// Report whether the route visits the POI with `poi_id`.
    #[must_use]
    pub fn visits(&self, poi_id: u64) -> bool {
        self.pois.iter().any(|poi| poi.id == poi_id)
    }
}
