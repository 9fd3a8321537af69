//! Resolve walking paths through ordered waypoints.
//!
//! The `RoadRouter` trait abstracts an external road-routing service. Callers
//! supply waypoints in visiting order and receive the service's candidate
//! paths, each with a distance, a duration and a `[lon, lat]` polyline.
//!
//! Routing failures are reported as [`RoadRoutingError`] values; the
//! [`GeometryResolver`](crate::GeometryResolver) absorbs them.

mod error;
mod provider;

pub use error::RoadRoutingError;
pub use provider::{RoadPath, RoadResponse, RoadRouter, STATUS_OK};
