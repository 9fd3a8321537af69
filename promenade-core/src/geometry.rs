//! Turn ordered waypoints into walking geometry.
//!
//! Resolution degrades in three tiers. The whole waypoint sequence is sent to
//! the road router in one request. When that fails each consecutive pair is
//! routed on its own, and a pair that still fails is bridged with a
//! straight line timed at walking speed. A result is therefore always
//! produced, possibly mixing tiers.
//!
//! # Examples
//! ```
//! use promenade_core::test_support::StubRoadRouter;
//! use promenade_core::{GeometryResolver, Point, ResolutionTier, RoadRoutingError};
//!
//! let router = StubRoadRouter::failing(RoadRoutingError::Network {
//!     url: "http://osrm.invalid".into(),
//!     message: "connection refused".into(),
//! });
//! let resolver = GeometryResolver::new(router);
//! let start = Point::new(55.7558, 37.6173);
//! let finish = Point::new(55.7520, 37.6175);
//!
//! let geometry = resolver.resolve(&[start, finish])?;
//! assert_eq!(geometry.points, vec![start, finish]);
//! assert_eq!(geometry.tiers, vec![ResolutionTier::StraightLine]);
//! # Ok::<(), promenade_core::GeometryError>(())
//! ```

use log::{debug, warn};
use thiserror::Error;

use crate::{GridPoint, Point, RoadPath, RoadRouter, RoadRoutingError, RouteOrigin};

/// Walking speed used for straight-line estimates: 5 km/h.
pub const WALKING_SPEED_MPS: f64 = 25.0 / 18.0;

/// Which tier produced a stretch of geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// One road request covered every waypoint.
    WholePath,
    /// A road request covered one pair of waypoints.
    Pairwise,
    /// A pair was bridged by a straight line.
    StraightLine,
}

/// Errors from [`GeometryResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A path needs a start and a finish.
    #[error("at least two waypoints are required, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },
}

/// Walking distance, time and polyline through a waypoint sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    /// Total distance in metres.
    pub length_m: f64,
    /// Total time in whole seconds.
    pub duration_s: u64,
    /// Polyline in walking order.
    pub points: Vec<Point>,
    /// Tier used for each resolved stretch, in order.
    pub tiers: Vec<ResolutionTier>,
}

impl RouteGeometry {
    /// A straight segment from `from` to `to` walked at `speed_mps`.
    #[must_use]
    pub fn straight(from: Point, to: Point, speed_mps: f64) -> Self {
        let length_m = from.haversine_m(to);
        Self {
            length_m,
            duration_s: seconds(length_m / speed_mps),
            points: vec![from, to],
            tiers: vec![ResolutionTier::StraightLine],
        }
    }

    fn from_road_path(path: &RoadPath, tier: ResolutionTier) -> Self {
        Self {
            length_m: path.distance_m,
            duration_s: seconds(path.duration_s),
            points: path.points(),
            tiers: vec![tier],
        }
    }

    const fn empty() -> Self {
        Self {
            length_m: 0.0,
            duration_s: 0,
            points: Vec::new(),
            tiers: Vec::new(),
        }
    }

    /// Append `next`, merging the junction point when both sides share it.
    fn extend(&mut self, next: Self) {
        self.length_m += next.length_m;
        self.duration_s = self.duration_s.saturating_add(next.duration_s);
        let mut points = next.points.into_iter().peekable();
        if self.points.last() == points.peek() {
            points.next();
        }
        self.points.extend(points);
        self.tiers.extend(next.tiers);
    }

    fn prepend(&mut self, head: Self) {
        let tail = std::mem::replace(self, head);
        self.extend(tail);
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "durations are validated as finite and non-negative before rounding"
)]
fn seconds(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Tunables for [`GeometryResolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    /// Speed used to time straight-line segments, in metres per second.
    pub walking_speed_mps: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            walking_speed_mps: WALKING_SPEED_MPS,
        }
    }
}

/// Resolves waypoint sequences through a [`RoadRouter`], degrading
/// gracefully when it fails.
#[derive(Debug, Clone)]
pub struct GeometryResolver<R> {
    router: R,
    config: GeometryConfig,
}

impl<R: RoadRouter> GeometryResolver<R> {
    /// Create a resolver with the default walking speed.
    pub fn new(router: R) -> Self {
        Self::with_config(router, GeometryConfig::default())
    }

    /// Create a resolver with explicit configuration.
    pub const fn with_config(router: R, config: GeometryConfig) -> Self {
        Self { router, config }
    }

    /// The router requests are sent to.
    pub const fn router(&self) -> &R {
        &self.router
    }

    /// The active configuration.
    pub const fn config(&self) -> GeometryConfig {
        self.config
    }

    /// Resolve geometry through `waypoints` in order.
    ///
    /// Routing failures never surface; they select a lower tier instead.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewWaypoints`] when fewer than two
    /// waypoints are supplied.
    pub fn resolve(&self, waypoints: &[Point]) -> Result<RouteGeometry, GeometryError> {
        if waypoints.len() < 2 {
            return Err(GeometryError::TooFewWaypoints {
                count: waypoints.len(),
            });
        }

        match self.request(waypoints, ResolutionTier::WholePath) {
            Ok(geometry) => Ok(geometry),
            Err(err) => {
                warn!(
                    "routing {} waypoints in one request failed, resolving pairwise: {err}",
                    waypoints.len()
                );
                Ok(self.resolve_pairwise(waypoints))
            }
        }
    }

    /// Resolve the walk described by `origin` through `stops`.
    ///
    /// Round trips are closed so the polyline starts and ends in the start's
    /// grid cell, bridging any gap the router left with a straight segment.
    ///
    /// # Errors
    ///
    /// Never fails in practice: the origin always contributes two waypoints.
    pub fn resolve_origin<I>(
        &self,
        origin: &RouteOrigin,
        stops: I,
    ) -> Result<RouteGeometry, GeometryError>
    where
        I: IntoIterator<Item = Point>,
    {
        let waypoints = origin.waypoints(stops);
        let mut geometry = self.resolve(&waypoints)?;
        if let RouteOrigin::Round { start, .. } = *origin {
            self.close_loop(&mut geometry, start);
        }
        Ok(geometry)
    }

    fn resolve_pairwise(&self, waypoints: &[Point]) -> RouteGeometry {
        let mut geometry = RouteGeometry::empty();
        for pair in waypoints.windows(2) {
            let &[from, to] = pair else { continue };
            let segment = self
                .request(&[from, to], ResolutionTier::Pairwise)
                .unwrap_or_else(|err| {
                    warn!("routing segment {from} -> {to} failed, using a straight line: {err}");
                    RouteGeometry::straight(from, to, self.config.walking_speed_mps)
                });
            geometry.extend(segment);
        }
        geometry
    }

    fn request(
        &self,
        waypoints: &[Point],
        tier: ResolutionTier,
    ) -> Result<RouteGeometry, RoadRoutingError> {
        debug!("requesting road path through {} waypoints", waypoints.len());
        let path = self.router.route(waypoints)?.into_best_path()?;
        Ok(RouteGeometry::from_road_path(&path, tier))
    }

    fn close_loop(&self, geometry: &mut RouteGeometry, start: Point) {
        let anchor = GridPoint::from_point(start);
        let speed = self.config.walking_speed_mps;

        if let Some(&first) = geometry.points.first()
            && GridPoint::from_point(first) != anchor
        {
            geometry.prepend(RouteGeometry::straight(start, first, speed));
        }
        if let Some(&last) = geometry.points.last()
            && GridPoint::from_point(last) != anchor
        {
            geometry.extend(RouteGeometry::straight(last, start, speed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubRoadRouter, network_error};
    use rstest::{fixture, rstest};

    #[fixture]
    fn waypoints() -> Vec<Point> {
        vec![
            Point::new(55.7558, 37.6173),
            Point::new(55.7520, 37.6175),
            Point::new(55.7494, 37.6130),
        ]
    }

    #[rstest]
    fn single_request_when_router_succeeds(waypoints: Vec<Point>) {
        let router = StubRoadRouter::echo();
        let geometry = GeometryResolver::new(&router)
            .resolve(&waypoints)
            .expect("resolve");

        assert_eq!(router.calls(), vec![waypoints.clone()]);
        assert_eq!(geometry.tiers, vec![ResolutionTier::WholePath]);
        assert_eq!(geometry.points, waypoints);
    }

    #[rstest]
    fn falls_back_to_pairs_when_whole_path_fails(waypoints: Vec<Point>) {
        let router = StubRoadRouter::pairwise_only();
        let geometry = GeometryResolver::new(&router)
            .resolve(&waypoints)
            .expect("resolve");

        assert_eq!(router.call_count(), 3);
        assert_eq!(
            geometry.tiers,
            vec![ResolutionTier::Pairwise, ResolutionTier::Pairwise]
        );
        assert_eq!(geometry.points, waypoints);
    }

    #[rstest]
    fn straight_lines_when_everything_fails(waypoints: Vec<Point>) {
        let router = StubRoadRouter::failing(network_error());
        let resolver = GeometryResolver::new(&router);
        let geometry = resolver.resolve(&waypoints).expect("resolve");

        let expected_length: f64 = waypoints
            .windows(2)
            .map(|pair| pair[0].haversine_m(pair[1]))
            .sum();
        assert!((geometry.length_m - expected_length).abs() < 1e-6);
        assert_eq!(geometry.points, waypoints);
        assert_eq!(
            geometry.tiers,
            vec![ResolutionTier::StraightLine, ResolutionTier::StraightLine]
        );
        assert_eq!(router.call_count(), 3);
    }

    #[rstest]
    fn mixed_tiers_are_stitched_in_order(waypoints: Vec<Point>) {
        let router = StubRoadRouter::echo()
            .fail_when_routing(waypoints.clone())
            .fail_when_routing(vec![waypoints[1], waypoints[2]]);
        let geometry = GeometryResolver::new(&router)
            .resolve(&waypoints)
            .expect("resolve");

        assert_eq!(
            geometry.tiers,
            vec![ResolutionTier::Pairwise, ResolutionTier::StraightLine]
        );
        assert_eq!(geometry.points, waypoints);
    }

    #[rstest]
    fn straight_line_time_uses_walking_speed() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(0.01, 0.0);
        let geometry = RouteGeometry::straight(from, to, WALKING_SPEED_MPS);
        // 0.01° of latitude is about 1112 m, which takes about 801 s at 5 km/h.
        assert_eq!(geometry.duration_s, 801);
    }

    #[rstest]
    fn duration_is_rounded_to_whole_seconds() {
        let router = StubRoadRouter::echo().with_duration(86.5);
        let geometry = GeometryResolver::new(&router)
            .resolve(&[Point::new(1.0, 1.0), Point::new(1.0, 1.001)])
            .expect("resolve");
        assert_eq!(geometry.duration_s, 87);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn rejects_fewer_than_two_waypoints(#[case] count: usize) {
        let router = StubRoadRouter::echo();
        let points = vec![Point::new(0.0, 0.0); count];
        let err = GeometryResolver::new(&router)
            .resolve(&points)
            .expect_err("too few waypoints");
        assert_eq!(err, GeometryError::TooFewWaypoints { count });
        assert_eq!(router.call_count(), 0);
    }

    #[rstest]
    fn round_origin_is_closed_at_the_start() {
        let start = Point::new(55.7558, 37.6173);
        let snapped_first = Point::new(55.7570, 37.6190);
        let snapped_last = Point::new(55.7540, 37.6150);
        let router = StubRoadRouter::echo().with_snapping(snapped_first, snapped_last);
        let origin = RouteOrigin::Round {
            start,
            radius_m: 500,
        };

        let geometry = GeometryResolver::new(&router)
            .resolve_origin(&origin, [Point::new(55.7600, 37.6200)])
            .expect("resolve");

        assert_eq!(geometry.points.first(), Some(&start));
        assert_eq!(geometry.points.last(), Some(&start));
        assert_eq!(
            geometry.tiers,
            vec![
                ResolutionTier::StraightLine,
                ResolutionTier::WholePath,
                ResolutionTier::StraightLine
            ]
        );
    }

    #[rstest]
    fn direct_origin_is_left_open() {
        let start = Point::new(55.7558, 37.6173);
        let finish = Point::new(55.7494, 37.6130);
        let router = StubRoadRouter::echo();
        let geometry = GeometryResolver::new(&router)
            .resolve_origin(&RouteOrigin::Direct { start, finish }, [])
            .expect("resolve");
        assert_eq!(geometry.points, vec![start, finish]);
    }

    #[rstest]
    fn junction_points_are_not_duplicated() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 0.001);
        let c = Point::new(0.0, 0.002);
        let mut geometry = RouteGeometry::straight(a, b, WALKING_SPEED_MPS);
        geometry.extend(RouteGeometry::straight(b, c, WALKING_SPEED_MPS));
        assert_eq!(geometry.points, vec![a, b, c]);
    }
}
