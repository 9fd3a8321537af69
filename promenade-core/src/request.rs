//! Validated route requests.
//!
//! Requests are checked before any external call: a request that reaches the
//! planner always has a supported kind, valid coordinates, known filters
//! and, for round trips, a positive radius.
//!
//! # Examples
//! ```
//! use promenade_core::{Point, RouteKind, RouteRequest};
//!
//! let request = RouteRequest::parse(
//!     "round",
//!     &[Point::new(55.7558, 37.6173)],
//!     &["museum", "park"],
//!     1_500,
//! )?;
//! assert_eq!(request.origin.kind(), RouteKind::Round);
//! # Ok::<(), promenade_core::ValidationError>(())
//! ```

use thiserror::Error;

use crate::{CacheKey, FilterSet, Point, RouteKind, RouteOrigin};

/// Reasons a route request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The route type is neither `direct` nor `round`.
    #[error("unsupported route kind '{kind}', expected 'direct' or 'round'")]
    UnsupportedRouteKind {
        /// The kind as supplied.
        kind: String,
    },
    /// Not enough points for the route kind.
    #[error("{kind} routes need {required} point(s), got {supplied}")]
    MissingPoints {
        /// Requested kind.
        kind: RouteKind,
        /// Points the kind needs.
        required: usize,
        /// Points supplied.
        supplied: usize,
    },
    /// A coordinate is not finite or outside WGS84 ranges.
    #[error("point {index} ({lat}, {lon}) is not a valid WGS84 coordinate")]
    InvalidCoordinate {
        /// Position of the point in the request.
        index: usize,
        /// Latitude as supplied, formatted.
        lat: String,
        /// Longitude as supplied, formatted.
        lon: String,
    },
    /// A filter names no known category.
    #[error("unknown filter '{name}'")]
    UnknownFilter {
        /// The filter as supplied.
        name: String,
    },
    /// A round trip was requested without a positive radius.
    #[error("round routes need a radius greater than zero")]
    MissingRadius,
    /// The waypoint list could not form a path.
    #[error("a route needs at least two waypoints, got {count}")]
    TooFewWaypoints {
        /// Waypoints available.
        count: usize,
    },
}

/// A request the planner can serve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    /// Requested endpoints, exactly as supplied.
    pub origin: RouteOrigin,
    /// Requested categories.
    pub filters: FilterSet,
}

impl RouteRequest {
    /// A validated point-to-point request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinate`] for invalid endpoints.
    pub fn direct(start: Point, finish: Point, filters: FilterSet) -> Result<Self, ValidationError> {
        check_points(&[start, finish])?;
        Ok(Self {
            origin: RouteOrigin::Direct { start, finish },
            filters,
        })
    }

    /// A validated round-trip request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinate`] for an invalid start
    /// and [`ValidationError::MissingRadius`] for a zero radius.
    pub fn round(start: Point, radius_m: u32, filters: FilterSet) -> Result<Self, ValidationError> {
        check_points(&[start])?;
        if radius_m == 0 {
            return Err(ValidationError::MissingRadius);
        }
        Ok(Self {
            origin: RouteOrigin::Round { start, radius_m },
            filters,
        })
    }

    /// Validate a request in its loosely typed inbound form.
    ///
    /// Direct routes use the first two points and round trips the first;
    /// extra points are ignored. `radius_m` is ignored for direct routes.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking the kind, then
    /// the point count, the coordinates, the filters and finally the radius.
    pub fn parse<S: AsRef<str>>(
        kind: &str,
        points: &[Point],
        filters: &[S],
        radius_m: u32,
    ) -> Result<Self, ValidationError> {
        let kind: RouteKind = kind.parse()?;
        let required = match kind {
            RouteKind::Direct => 2,
            RouteKind::Round => 1,
        };
        let endpoints = points
            .get(..required)
            .ok_or(ValidationError::MissingPoints {
                kind,
                required,
                supplied: points.len(),
            })?;
        check_points(endpoints)?;
        let filters = FilterSet::parse(filters)
            .map_err(|err| ValidationError::UnknownFilter { name: err.name })?;

        match *endpoints {
            [start, finish] => Self::direct(start, finish, filters),
            [start] => Self::round(start, radius_m, filters),
            _ => Err(ValidationError::MissingPoints {
                kind,
                required,
                supplied: points.len(),
            }),
        }
    }

    /// Cache key the request is served under.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_origin(&self.origin, self.filters)
    }
}

fn check_points(points: &[Point]) -> Result<(), ValidationError> {
    match points
        .iter()
        .enumerate()
        .find(|(_, point)| !point.is_valid())
    {
        Some((index, point)) => Err(ValidationError::InvalidCoordinate {
            index,
            lat: point.lat.to_string(),
            lon: point.lon.to_string(),
        }),
        None => Ok(()),
    }
}
