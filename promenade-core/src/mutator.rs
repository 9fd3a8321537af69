//! Copy-on-write edits of stored routes.

use std::sync::Arc;

use log::info;

use crate::{
    GeometryResolver, NewRoute, PlannerError, PointOfInterest, RoadRouter, Route, RouteCache,
    RouteId, RouteNamer, RouteStore, SequentialNamer,
};

/// Derives new routes from stored ones.
///
/// Edits never touch the source record: every edit is stored as a new route
/// whose `derived_from` names the source.
pub struct RouteMutator<S, R> {
    cache: RouteCache<S>,
    resolver: GeometryResolver<R>,
    namer: Arc<dyn RouteNamer>,
}

impl<S, R> std::fmt::Debug for RouteMutator<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMutator").finish_non_exhaustive()
    }
}

impl<S: RouteStore, R: RoadRouter> RouteMutator<S, R> {
    /// Create a mutator with default walking speed and naming.
    pub fn new(store: S, router: R) -> Self {
        Self::from_parts(
            RouteCache::new(store),
            GeometryResolver::new(router),
            Arc::new(SequentialNamer),
        )
    }

    /// Assemble a mutator from configured parts.
    pub const fn from_parts(
        cache: RouteCache<S>,
        resolver: GeometryResolver<R>,
        namer: Arc<dyn RouteNamer>,
    ) -> Self {
        Self {
            cache,
            resolver,
            namer,
        }
    }

    /// Store a copy of route `route_id` that skips POI `poi_id`.
    ///
    /// The copy keeps the source's endpoints, radius and filters, is
    /// re-resolved through the remaining stops, and is named like any new
    /// route. The source route is returned unchanged by later loads.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::NotFound`] for an unknown route,
    /// [`PlannerError::PoiNotInRoute`] when the route does not visit the POI,
    /// and [`PlannerError::Storage`] when loading or inserting fails. Nothing
    /// is stored on error.
    pub fn remove_point(&self, route_id: RouteId, poi_id: u64) -> Result<Route, PlannerError> {
        let source = self
            .cache
            .load(route_id)?
            .ok_or(PlannerError::NotFound { route_id })?;
        let remaining = without_poi(&source.pois, poi_id)
            .ok_or(PlannerError::PoiNotInRoute { route_id, poi_id })?;

        let geometry = self
            .resolver
            .resolve_origin(&source.origin, remaining.iter().map(|poi| poi.location))?;
        let draft = NewRoute {
            origin: source.origin,
            filters: source.filters,
            pois: remaining,
            geometry,
            derived_from: Some(route_id),
        };
        let route = self.cache.persist(draft, self.namer.as_ref())?;
        info!("removed POI {poi_id} from route {route_id} as route {}", route.id);
        Ok(route)
    }
}

/// A copy of `pois` without the first entry whose id is `poi_id`.
fn without_poi(pois: &[PointOfInterest], poi_id: u64) -> Option<Vec<PointOfInterest>> {
    let position = pois.iter().position(|poi| poi.id == poi_id)?;
    let mut remaining = pois.to_vec();
    remaining.remove(position);
    Some(remaining)
}
