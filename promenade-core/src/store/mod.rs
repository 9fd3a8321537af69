//! Persistence traits for computed routes.
//!
//! The `RouteStore` trait is the storage seam behind the
//! [`RouteCache`](crate::RouteCache). Records are written once and only their
//! `name` and `popularity` change afterwards.

use std::sync::Arc;

use thiserror::Error;

use crate::{CacheKey, FilterSet, PointOfInterest, Route, RouteGeometry, RouteId, RouteOrigin};

#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use schema::SCHEMA_VERSION;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteRouteStore, SqliteRouteStoreError};

/// Boxed backend failure carried by [`StoreError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by [`RouteStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed a query.
    #[error("failed to {operation}: {source}")]
    Query {
        /// What the store was doing, such as `insert route`.
        operation: &'static str,
        /// Backend failure.
        #[source]
        source: BoxError,
    },
    /// A route field could not be serialised for storage.
    #[error("failed to encode route {field}: {source}")]
    Encode {
        /// Field being encoded.
        field: &'static str,
        /// Encoder failure.
        #[source]
        source: BoxError,
    },
    /// A stored record could not be turned back into a [`Route`].
    #[error("stored route {id} is unreadable: {message}")]
    Decode {
        /// Identifier of the unreadable record.
        id: RouteId,
        /// What was wrong with it.
        message: String,
    },
    /// An update targeted a record that does not exist.
    #[error("route {id} does not exist")]
    Missing {
        /// Identifier that matched nothing.
        id: RouteId,
    },
}

impl StoreError {
    /// Wrap a backend failure that happened during `operation`.
    pub fn query(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Query {
            operation,
            source: source.into(),
        }
    }
}

/// A route ready to be persisted, before it has an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
    /// Endpoints the route was requested with.
    pub origin: RouteOrigin,
    /// Categories the route was requested with.
    pub filters: FilterSet,
    /// Points of interest in visiting order.
    pub pois: Vec<PointOfInterest>,
    /// Resolved walking geometry.
    pub geometry: RouteGeometry,
    /// The route this one was edited from, if any.
    pub derived_from: Option<RouteId>,
}

impl NewRoute {
    /// Cache key the record is stored under.
    ///
    /// Derived from the request origin only, so a lookup with the same
    /// request finds it.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_origin(&self.origin, self.filters)
    }

    /// Materialise the stored form once the backend assigned `id`.
    ///
    /// The name starts empty and popularity at zero.
    #[must_use]
    pub fn into_route(self, id: RouteId) -> Route {
        Route {
            id,
            origin: self.origin,
            pois: self.pois,
            points: self.geometry.points,
            length_m: self.geometry.length_m,
            duration_s: self.geometry.duration_s,
            name: String::new(),
            filters: self.filters,
            popularity: 0,
            derived_from: self.derived_from,
        }
    }
}

/// Persisted route records.
///
/// Implementations must treat records with `derived_from` set as invisible
/// to [`RouteStore::find_by_key`], and must return the lowest identifier when
/// several records share a key.
///
/// # Examples
///
/// ```rust
/// use promenade_core::test_support::MemoryRouteStore;
/// use promenade_core::{
///     CacheKey, FilterSet, NewRoute, Point, RouteGeometry, RouteOrigin, RouteStore,
/// };
///
/// let store = MemoryRouteStore::default();
/// let start = Point::new(55.75, 37.61);
/// let finish = Point::new(55.76, 37.62);
/// let draft = NewRoute {
///     origin: RouteOrigin::Direct { start, finish },
///     filters: FilterSet::EMPTY,
///     pois: Vec::new(),
///     geometry: RouteGeometry::straight(start, finish, 1.4),
///     derived_from: None,
/// };
/// let id = store.insert(&draft)?;
///
/// let found = store.find_by_key(&draft.cache_key())?.expect("stored route");
/// assert_eq!(found.id, id);
/// # Ok::<(), promenade_core::StoreError>(())
/// ```
pub trait RouteStore {
    /// Persist `route` and return its new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when encoding or the write fails.
    fn insert(&self, route: &NewRoute) -> Result<RouteId, StoreError>;

    /// Load the record with `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails or the record is corrupt.
    fn find_by_id(&self, id: RouteId) -> Result<Option<Route>, StoreError>;

    /// Load the lowest-id original record stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails or the record is corrupt.
    fn find_by_key(&self, key: &CacheKey) -> Result<Option<Route>, StoreError>;

    /// Add one to the popularity counter of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] for unknown ids and
    /// [`StoreError::Query`] when the write fails.
    fn increment_popularity(&self, id: RouteId) -> Result<(), StoreError>;

    /// Replace the display name of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] for unknown ids and
    /// [`StoreError::Query`] when the write fails.
    fn update_name(&self, id: RouteId, name: &str) -> Result<(), StoreError>;
}

macro_rules! forward_route_store {
    ($($wrapper:ty),+) => {$(
        impl<T: RouteStore + ?Sized> RouteStore for $wrapper {
            fn insert(&self, route: &NewRoute) -> Result<RouteId, StoreError> {
                (**self).insert(route)
            }

            fn find_by_id(&self, id: RouteId) -> Result<Option<Route>, StoreError> {
                (**self).find_by_id(id)
            }

            fn find_by_key(&self, key: &CacheKey) -> Result<Option<Route>, StoreError> {
                (**self).find_by_key(key)
            }

            fn increment_popularity(&self, id: RouteId) -> Result<(), StoreError> {
                (**self).increment_popularity(id)
            }

            fn update_name(&self, id: RouteId, name: &str) -> Result<(), StoreError> {
                (**self).update_name(id, name)
            }
        }
    )+};
}

forward_route_store!(&T, Arc<T>, Box<T>);
