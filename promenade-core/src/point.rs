//! WGS84 coordinates and the conversions at the routing-service boundary.
//!
//! Routing services speak `[lon, lat]` pairs while callers think in
//! `(lat, lon)`. [`Point::from_lon_lat`] and [`Point::to_lon_lat`] are the
//! only places where the axis order flips.
//!
//! # Examples
//! ```
//! use promenade_core::Point;
//!
//! let point = Point::from_lon_lat([37.6173, 55.7558]);
//! assert_eq!(point.lat, 55.7558);
//! assert_eq!(point.to_lon_lat(), [37.6173, 55.7558]);
//! ```

use geo::{Distance, Haversine};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Latitude in degrees, north positive.
    pub lat: f64,
    /// Longitude in degrees, east positive.
    pub lon: f64,
}

impl Point {
    /// Construct a point from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point from a routing-service `[lon, lat]` pair.
    #[must_use]
    pub const fn from_lon_lat(pair: [f64; 2]) -> Self {
        let [lon, lat] = pair;
        Self { lat, lon }
    }

    /// Encode the point as a routing-service `[lon, lat]` pair.
    #[must_use]
    pub const fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Report whether both axes are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn haversine_m(self, other: Self) -> f64 {
        Haversine.distance(geo::Point::from(self), geo::Point::from(other))
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(point: Point) -> Self {
        Self::new(point.lon, point.lat)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(point: Point) -> Self {
        Self {
            x: point.lon,
            y: point.lat,
        }
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}
