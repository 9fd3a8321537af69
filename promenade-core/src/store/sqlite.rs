//! SQLite-backed route store.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::{
    CacheKey, FilterSet, GridPoint, Point, PointOfInterest, Route, RouteId, RouteOrigin,
};

use super::{NewRoute, RouteStore, StoreError, schema::initialise_schema};

const SELECT_BY_ID: &str = "SELECT id, kind, start_lat, start_lon, finish_lat, finish_lon,
        radius, filters, length, duration, pois, points, name, popularity, derived_from
    FROM routes
    WHERE id = ?1";

const SELECT_DIRECT_BY_KEY: &str = "SELECT id, kind, start_lat, start_lon, finish_lat, finish_lon,
        radius, filters, length, duration, pois, points, name, popularity, derived_from
    FROM routes
    WHERE kind = 'direct' AND derived_from IS NULL
        AND key_start_lat = ?1 AND key_start_lon = ?2
        AND key_finish_lat = ?3 AND key_finish_lon = ?4
        AND filters = ?5
    ORDER BY id
    LIMIT 1";

const SELECT_ROUND_BY_KEY: &str = "SELECT id, kind, start_lat, start_lon, finish_lat, finish_lon,
        radius, filters, length, duration, pois, points, name, popularity, derived_from
    FROM routes
    WHERE kind = 'round' AND derived_from IS NULL
        AND key_start_lat = ?1 AND key_start_lon = ?2
        AND radius = ?3
        AND filters = ?4
    ORDER BY id
    LIMIT 1";

const INSERT_DIRECT: &str = "INSERT INTO routes (
        kind, start_lat, start_lon, finish_lat, finish_lon,
        key_start_lat, key_start_lon, key_finish_lat, key_finish_lon,
        filters, length, duration, pois, points, derived_from
    ) VALUES ('direct', ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

const INSERT_ROUND: &str = "INSERT INTO routes (
        kind, start_lat, start_lon, radius,
        key_start_lat, key_start_lon,
        filters, length, duration, pois, points, derived_from
    ) VALUES ('round', ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

/// Error raised when opening or migrating a route database.
#[derive(Debug, Error)]
pub enum SqliteRouteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Enabling foreign-key enforcement failed.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A schema statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Name of the failing step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database was created by an incompatible release.
    #[error(
        "expected routes schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}

/// Route store backed by a single SQLite connection.
///
/// The connection sits behind a mutex so the store can be shared between
/// threads; statements are short and never held across calls.
///
/// # Examples
/// ```
/// use promenade_core::{
///     FilterSet, NewRoute, Point, RouteGeometry, RouteOrigin, RouteStore, SqliteRouteStore,
/// };
///
/// let store = SqliteRouteStore::open_in_memory()?;
/// let start = Point::new(48.8584, 2.2945);
/// let draft = NewRoute {
///     origin: RouteOrigin::Round { start, radius_m: 1_000 },
///     filters: FilterSet::EMPTY,
///     pois: Vec::new(),
///     geometry: RouteGeometry::straight(start, start, 1.4),
///     derived_from: None,
/// };
/// let id = store.insert(&draft)?;
/// assert_eq!(store.find_by_id(id)?.map(|route| route.origin), Some(draft.origin));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SqliteRouteStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteRouteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteRouteStore").finish_non_exhaustive()
    }
}

impl SqliteRouteStore {
    /// Open or create a route database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteRouteStoreError`] when the file cannot be opened or the
    /// schema cannot be prepared.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteRouteStoreError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteRouteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Create a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteRouteStoreError`] when the schema cannot be prepared.
    pub fn open_in_memory() -> Result<Self, SqliteRouteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteRouteStoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Adopt an existing connection, preparing the schema on it.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteRouteStoreError`] when the schema cannot be prepared.
    pub fn from_connection(mut connection: Connection) -> Result<Self, SqliteRouteStoreError> {
        connection
            .pragma_update(None, "foreign_keys", true)
            .map_err(|source| SqliteRouteStoreError::ForeignKeys { source })?;

        let transaction =
            connection
                .transaction()
                .map_err(|source| SqliteRouteStoreError::Migration {
                    step: "begin schema transaction",
                    source,
                })?;
        initialise_schema(&transaction)?;
        transaction
            .commit()
            .map_err(|source| SqliteRouteStoreError::Migration {
                step: "commit schema transaction",
                source,
            })?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a statement half-applied.
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RouteStore for SqliteRouteStore {
    fn insert(&self, route: &NewRoute) -> Result<RouteId, StoreError> {
        let pois = encode_json("pois", &route.pois)?;
        let points = encode_json("points", &route.geometry.points)?;
        let derived_from = route.derived_from.map(RouteId::get);
        let connection = self.connection();

        let inserted = match route.origin {
            RouteOrigin::Direct { start, finish } => {
                let key_start = GridPoint::from_point(start);
                let key_finish = GridPoint::from_point(finish);
                connection.execute(
                    INSERT_DIRECT,
                    params![
                        start.lat,
                        start.lon,
                        finish.lat,
                        finish.lon,
                        key_start.lat,
                        key_start.lon,
                        key_finish.lat,
                        key_finish.lon,
                        route.filters.bits(),
                        route.geometry.length_m,
                        route.geometry.duration_s,
                        pois,
                        points,
                        derived_from,
                    ],
                )
            }
            RouteOrigin::Round { start, radius_m } => {
                let key_start = GridPoint::from_point(start);
                connection.execute(
                    INSERT_ROUND,
                    params![
                        start.lat,
                        start.lon,
                        radius_m,
                        key_start.lat,
                        key_start.lon,
                        route.filters.bits(),
                        route.geometry.length_m,
                        route.geometry.duration_s,
                        pois,
                        points,
                        derived_from,
                    ],
                )
            }
        };
        inserted.map_err(|source| StoreError::query("insert route", source))?;

        let id = RouteId::new(connection.last_insert_rowid());
        debug!("stored {} route {id}", route.origin.kind());
        Ok(id)
    }

    fn find_by_id(&self, id: RouteId) -> Result<Option<Route>, StoreError> {
        let row = self
            .connection()
            .query_row(SELECT_BY_ID, [id.get()], RouteRow::read)
            .optional()
            .map_err(|source| StoreError::query("load route by id", source))?;
        row.map(RouteRow::into_route).transpose()
    }

    fn find_by_key(&self, key: &CacheKey) -> Result<Option<Route>, StoreError> {
        let connection = self.connection();
        let row = match *key {
            CacheKey::Direct {
                start,
                finish,
                filters,
            } => connection.query_row(
                SELECT_DIRECT_BY_KEY,
                params![start.lat, start.lon, finish.lat, finish.lon, filters.bits()],
                RouteRow::read,
            ),
            CacheKey::Round {
                start,
                radius_m,
                filters,
            } => connection.query_row(
                SELECT_ROUND_BY_KEY,
                params![start.lat, start.lon, radius_m, filters.bits()],
                RouteRow::read,
            ),
        }
        .optional()
        .map_err(|source| StoreError::query("look up route by key", source))?;
        row.map(RouteRow::into_route).transpose()
    }

    fn increment_popularity(&self, id: RouteId) -> Result<(), StoreError> {
        let changed = self
            .connection()
            .execute(
                "UPDATE routes SET popularity = popularity + 1 WHERE id = ?1",
                [id.get()],
            )
            .map_err(|source| StoreError::query("increment route popularity", source))?;
        ensure_changed(changed, id)
    }

    fn update_name(&self, id: RouteId, name: &str) -> Result<(), StoreError> {
        let changed = self
            .connection()
            .execute(
                "UPDATE routes SET name = ?1 WHERE id = ?2",
                params![name, id.get()],
            )
            .map_err(|source| StoreError::query("rename route", source))?;
        ensure_changed(changed, id)
    }
}

const fn ensure_changed(changed: usize, id: RouteId) -> Result<(), StoreError> {
    if changed == 0 {
        Err(StoreError::Missing { id })
    } else {
        Ok(())
    }
}

fn encode_json<T: serde::Serialize + ?Sized>(
    field: &'static str,
    value: &T,
) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Encode {
        field,
        source: source.into(),
    })
}

/// Raw column values of one `routes` row.
struct RouteRow {
    id: i64,
    kind: String,
    start_lat: f64,
    start_lon: f64,
    finish_lat: Option<f64>,
    finish_lon: Option<f64>,
    radius: Option<u32>,
    filters: u32,
    length: f64,
    duration: u64,
    pois: String,
    points: String,
    name: String,
    popularity: u64,
    derived_from: Option<i64>,
}

impl RouteRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            start_lat: row.get(2)?,
            start_lon: row.get(3)?,
            finish_lat: row.get(4)?,
            finish_lon: row.get(5)?,
            radius: row.get(6)?,
            filters: row.get(7)?,
            length: row.get(8)?,
            duration: row.get(9)?,
            pois: row.get(10)?,
            points: row.get(11)?,
            name: row.get(12)?,
            popularity: row.get(13)?,
            derived_from: row.get(14)?,
        })
    }

    fn into_route(self) -> Result<Route, StoreError> {
        let id = RouteId::new(self.id);
        let start = Point::new(self.start_lat, self.start_lon);
        let origin = match (self.kind.as_str(), self.finish_lat, self.finish_lon, self.radius) {
            ("direct", Some(lat), Some(lon), _) => RouteOrigin::Direct {
                start,
                finish: Point::new(lat, lon),
            },
            ("round", _, _, Some(radius_m)) => RouteOrigin::Round { start, radius_m },
            (kind, ..) => {
                return Err(StoreError::Decode {
                    id,
                    message: format!("incomplete endpoints for {kind} route"),
                });
            }
        };
        let pois: Vec<PointOfInterest> = decode_json(id, "pois", &self.pois)?;
        let points: Vec<Point> = decode_json(id, "points", &self.points)?;

        Ok(Route {
            id,
            origin,
            pois,
            points,
            length_m: self.length,
            duration_s: self.duration,
            name: self.name,
            filters: FilterSet::from_bits(self.filters),
            popularity: self.popularity,
            derived_from: self.derived_from.map(RouteId::new),
        })
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    id: RouteId,
    field: &'static str,
    payload: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(payload).map_err(|err| StoreError::Decode {
        id,
        message: format!("invalid {field} payload: {err}"),
    })
}
