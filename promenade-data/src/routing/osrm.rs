//! OSRM API response types for the Route service.
//!
//! The Route service finds the fastest walk through the supplied coordinates
//! in order. Requests ask for `geometries=geojson`, so each route carries its
//! polyline as `[lon, lat]` pairs.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use promenade_core::{RoadPath, RoadResponse, STATUS_OK};
use serde::Deserialize;

/// OSRM Route API response.
///
/// The response contains routes on success or an error message on failure.
/// The `code` field indicates the response status.
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"InvalidQuery"` - Invalid query parameters
    /// - `"NoRoute"` - No route found between the coordinates
    /// - `"TooBig"` - Too many coordinates in the request
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Candidate routes, best first.
    pub routes: Option<Vec<OsrmRoute>>,
}

/// One route in an OSRM answer.
#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    /// Distance in metres.
    pub distance: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// GeoJSON line string.
    pub geometry: LineString,
}

/// GeoJSON `LineString` geometry.
#[derive(Debug, Deserialize)]
pub struct LineString {
    /// `[lon, lat]` positions.
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }
}

impl From<RouteResponse> for RoadResponse {
    fn from(response: RouteResponse) -> Self {
        let paths = response
            .routes
            .unwrap_or_default()
            .into_iter()
            .map(|route| RoadPath {
                distance_m: route.distance,
                duration_s: route.duration,
                coordinates: route.geometry.coordinates,
            })
            .collect();
        Self {
            code: response.code,
            message: response.message,
            paths,
        }
    }
}
