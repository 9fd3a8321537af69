//! Cached route records keyed by normalised request parameters.

use log::{debug, info, warn};

use crate::{CacheKey, NewRoute, Route, RouteId, RouteNamer, RouteStore, StoreError};

/// Cache of computed routes over a [`RouteStore`].
///
/// Hits bump the route's popularity and name updates are applied on a
/// best-effort basis: a failure of either is logged and does not fail the
/// request.
#[derive(Debug, Clone)]
pub struct RouteCache<S> {
    store: S,
}

impl<S: RouteStore> RouteCache<S> {
    /// Wrap `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Find the original route stored under `key` and count the visit.
    ///
    /// The returned popularity includes this visit when the increment
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup itself fails.
    pub fn lookup(&self, key: &CacheKey) -> Result<Option<Route>, StoreError> {
        let Some(mut route) = self.store.find_by_key(key)? else {
            debug!("route cache miss for {key:?}");
            return Ok(None);
        };
        debug!("route cache hit for {key:?}: route {}", route.id);

        match self.store.increment_popularity(route.id) {
            Ok(()) => route.popularity = route.popularity.saturating_add(1),
            Err(err) => warn!("failed to bump popularity of route {}: {err}", route.id),
        }
        Ok(Some(route))
    }

    /// Persist a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    pub fn insert(&self, route: &NewRoute) -> Result<RouteId, StoreError> {
        self.store.insert(route)
    }

    /// Rename route `id`, logging rather than returning failures.
    pub fn update_name(&self, id: RouteId, name: &str) {
        if let Err(err) = self.store.update_name(id, name) {
            warn!("failed to store name of route {id}: {err}");
        }
    }

    /// Load route `id` without counting a visit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    pub fn load(&self, id: RouteId) -> Result<Option<Route>, StoreError> {
        self.store.find_by_id(id)
    }

    /// Insert `draft`, then name the new record with `namer`.
    ///
    /// The returned route carries the generated name even when storing it
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn persist(&self, draft: NewRoute, namer: &dyn RouteNamer) -> Result<Route, StoreError> {
        let id = self.insert(&draft)?;
        let mut route = draft.into_route(id);
        route.name = namer.name(&route);
        self.update_name(id, &route.name);
        info!(
            "created {} route {id} with {} stops, {:.0} m",
            route.kind(),
            route.pois.len(),
            route.length_m
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRouteStore;
    use crate::{FilterSet, Point, RouteGeometry, RouteOrigin, SequentialNamer};
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> NewRoute {
        let start = Point::new(40.4168, -3.7038);
        let finish = Point::new(40.4153, -3.6845);
        NewRoute {
            origin: RouteOrigin::Direct { start, finish },
            filters: FilterSet::EMPTY,
            pois: Vec::new(),
            geometry: RouteGeometry::straight(start, finish, 1.4),
            derived_from: None,
        }
    }

    #[rstest]
    fn persist_names_the_route_after_its_id(draft: NewRoute) {
        let cache = RouteCache::new(MemoryRouteStore::default());
        let route = cache.persist(draft, &SequentialNamer).expect("persist");

        assert_eq!(route.name, format!("Route {}", route.id));
        let stored = cache.load(route.id).expect("load").expect("exists");
        assert_eq!(stored.name, route.name);
    }

    #[rstest]
    fn lookup_counts_visits(draft: NewRoute) {
        let cache = RouteCache::new(MemoryRouteStore::default());
        let id = cache.insert(&draft).expect("insert");

        let first = cache.lookup(&draft.cache_key()).expect("lookup").expect("hit");
        let second = cache.lookup(&draft.cache_key()).expect("lookup").expect("hit");

        assert_eq!(first.id, id);
        assert_eq!(first.popularity, 1);
        assert_eq!(second.popularity, 2);
    }

    #[rstest]
    fn failed_popularity_bump_still_returns_the_route(draft: NewRoute) {
        let store = MemoryRouteStore::default();
        store.fail_popularity_updates(true);
        let cache = RouteCache::new(&store);
        cache.insert(&draft).expect("insert");

        let route = cache.lookup(&draft.cache_key()).expect("lookup").expect("hit");
        assert_eq!(route.popularity, 0);
    }

    #[rstest]
    fn failed_rename_keeps_generated_name(draft: NewRoute) {
        let store = MemoryRouteStore::default();
        store.fail_name_updates(true);
        let cache = RouteCache::new(&store);

        let route = cache.persist(draft, &SequentialNamer).expect("persist");
        assert_eq!(route.name, format!("Route {}", route.id));
        let stored = cache.load(route.id).expect("load").expect("exists");
        assert!(stored.name.is_empty());
    }

    #[rstest]
    fn load_does_not_count_visits(draft: NewRoute) {
        let cache = RouteCache::new(MemoryRouteStore::default());
        let id = cache.insert(&draft).expect("insert");
        cache.load(id).expect("load");
        let route = cache.load(id).expect("load").expect("exists");
        assert_eq!(route.popularity, 0);
    }
}
