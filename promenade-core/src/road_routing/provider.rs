//! Road-router trait and the response shape shared by its implementations.

use std::sync::Arc;

use crate::Point;

use super::error::RoadRoutingError;

/// Status code a routing service uses for a successful answer.
pub const STATUS_OK: &str = "Ok";

/// One candidate path returned by a routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadPath {
    /// Walking distance in metres.
    pub distance_m: f64,
    /// Walking time in seconds.
    pub duration_s: f64,
    /// Polyline as `[lon, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

impl RoadPath {
    /// The polyline converted to [`Point`] values.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        self.coordinates
            .iter()
            .copied()
            .map(Point::from_lon_lat)
            .collect()
    }
}

/// A routing service answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadResponse {
    /// Service status; [`STATUS_OK`] on success.
    pub code: String,
    /// Optional service message explaining a failure.
    pub message: Option<String>,
    /// Candidate paths, best first.
    pub paths: Vec<RoadPath>,
}

impl RoadResponse {
    /// Build a successful response.
    #[must_use]
    pub fn ok(paths: Vec<RoadPath>) -> Self {
        Self {
            code: STATUS_OK.to_owned(),
            message: None,
            paths,
        }
    }

    /// Check whether the service reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    /// Take the best path from a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`RoadRoutingError::Service`] when the status is not
    /// [`STATUS_OK`], and [`RoadRoutingError::Parse`] when there is no path
    /// or the best path is unusable (non-finite or negative measures, or a
    /// polyline with fewer than two coordinates).
    pub fn into_best_path(self) -> Result<RoadPath, RoadRoutingError> {
        if !self.is_ok() {
            return Err(RoadRoutingError::Service {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        let path = self
            .paths
            .into_iter()
            .next()
            .ok_or_else(|| RoadRoutingError::Parse {
                message: "response contains no routes".to_owned(),
            })?;
        let measures_valid = [path.distance_m, path.duration_s]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0);
        if !measures_valid {
            return Err(RoadRoutingError::Parse {
                message: format!(
                    "route has invalid measures: distance {}, duration {}",
                    path.distance_m, path.duration_s
                ),
            });
        }
        if path.coordinates.len() < 2 {
            return Err(RoadRoutingError::Parse {
                message: format!(
                    "route geometry has {} coordinates, expected at least 2",
                    path.coordinates.len()
                ),
            });
        }
        Ok(path)
    }
}

/// Resolve a walking path through ordered waypoints.
///
/// # Examples
///
/// ```rust
/// use promenade_core::{Point, RoadPath, RoadResponse, RoadRouter, RoadRoutingError};
///
/// struct StraightRouter;
///
/// impl RoadRouter for StraightRouter {
///     fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError> {
///         if waypoints.len() < 2 {
///             return Err(RoadRoutingError::EmptyInput { count: waypoints.len() });
///         }
///         Ok(RoadResponse::ok(vec![RoadPath {
///             distance_m: 0.0,
///             duration_s: 0.0,
///             coordinates: waypoints.iter().map(|p| p.to_lon_lat()).collect(),
///         }]))
///     }
/// }
///
/// let response = StraightRouter.route(&[Point::new(0.0, 0.0), Point::new(0.0, 1.0)])?;
/// assert!(response.is_ok());
/// # Ok::<(), RoadRoutingError>(())
/// ```
pub trait RoadRouter {
    /// Request a path visiting `waypoints` in order.
    ///
    /// Implementations must return `Err(RoadRoutingError::EmptyInput)` when
    /// fewer than two waypoints are supplied.
    fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError>;
}

impl<T: RoadRouter + ?Sized> RoadRouter for &T {
    fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError> {
        (**self).route(waypoints)
    }
}

impl<T: RoadRouter + ?Sized> RoadRouter for Arc<T> {
    fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError> {
        (**self).route(waypoints)
    }
}

impl<T: RoadRouter + ?Sized> RoadRouter for Box<T> {
    fn route(&self, waypoints: &[Point]) -> Result<RoadResponse, RoadRoutingError> {
        (**self).route(waypoints)
    }
}
