//! Baseline stop ordering for direct walks and loops.
//!
//! Distances are measured on a local equirectangular plane centred on the
//! reference point, which is accurate to well under a metre across a
//! walking-scale area.

use std::cmp::Ordering;

use promenade_core::{METRES_PER_DEGREE, Point, PointOfInterest};

/// Offset of `point` from `origin` in metres, as `(east, north)`.
fn local_offset(origin: Point, point: Point) -> (f64, f64) {
    let lon_scale = origin.lat.to_radians().cos();
    (
        (point.lon - origin.lon) * lon_scale * METRES_PER_DEGREE,
        (point.lat - origin.lat) * METRES_PER_DEGREE,
    )
}

/// Keep the candidates inside a corridor around `start`→`finish` and order
/// them by how far along the walk they lie.
///
/// The corridor half width is `corridor_ratio` times the walk length. When
/// more than `max_stops` candidates qualify, the ones closest to the
/// straight line win.
pub(super) fn order_along_corridor(
    start: Point,
    finish: Point,
    candidates: Vec<PointOfInterest>,
    corridor_ratio: f64,
    max_stops: usize,
) -> Vec<PointOfInterest> {
    let (dx, dy) = local_offset(start, finish);
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq <= f64::EPSILON || max_stops == 0 {
        return Vec::new();
    }
    let length = length_sq.sqrt();
    let half_width = corridor_ratio * length;

    let mut placed: Vec<(f64, f64, PointOfInterest)> = candidates
        .into_iter()
        .filter_map(|poi| {
            let (px, py) = local_offset(start, poi.location);
            let along = px.mul_add(dx, py * dy) / length_sq;
            let offset = px.mul_add(dy, -(py * dx)).abs() / length;
            ((0.0..=1.0).contains(&along) && offset <= half_width).then_some((along, offset, poi))
        })
        .collect();

    placed.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.id.cmp(&b.2.id)));
    placed.truncate(max_stops);
    placed.sort_by(|a, b| a.0.total_cmp(&b.0));
    placed.into_iter().map(|(_, _, poi)| poi).collect()
}

/// Keep the candidates within `radius_m` of `center`, cap them at the
/// `max_stops` nearest, and order them clockwise from north.
pub(super) fn order_around_center(
    center: Point,
    radius_m: u32,
    candidates: Vec<PointOfInterest>,
    max_stops: usize,
) -> Vec<PointOfInterest> {
    let radius = f64::from(radius_m);
    let mut nearby: Vec<(f64, PointOfInterest)> = candidates
        .into_iter()
        .map(|poi| (center.haversine_m(poi.location), poi))
        .filter(|(distance, _)| *distance <= radius)
        .collect();

    nearby.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
    nearby.truncate(max_stops);

    let mut ordered: Vec<(f64, PointOfInterest)> = nearby
        .into_iter()
        .map(|(_, poi)| (bearing(center, poi.location), poi))
        .collect();
    ordered.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => a.1.id.cmp(&b.1.id),
        other => other,
    });
    ordered.into_iter().map(|(_, poi)| poi).collect()
}

/// Clockwise angle from north in radians, in `[0, 2π)`.
fn bearing(center: Point, point: Point) -> f64 {
    let (east, north) = local_offset(center, point);
    east.atan2(north).rem_euclid(std::f64::consts::TAU)
}
