//! SQLite catalogue of points of interest.
//!
//! [`SqlitePoiCatalogue`] implements [`PathSelector`] over a `pois` table
//! holding one row per POI with its WGS84 position, category and JSON tags.
//! Box queries and random samples run in SQL; ordering happens in memory
//! with simple corridor and bearing heuristics.
//!
//! # Examples
//! ```
//! use geo::{Coord, Rect};
//! use promenade_core::{Category, FilterSet, PathSelector, Point, PointOfInterest};
//! use promenade_data::SqlitePoiCatalogue;
//!
//! let catalogue = SqlitePoiCatalogue::open_in_memory()?;
//! catalogue.insert_pois(&[PointOfInterest::with_empty_tags(
//!     1,
//!     Point::new(51.5007, -0.1246),
//!     Category::Monument,
//! )])?;
//!
//! let bbox = Rect::new(Coord { x: -0.13, y: 51.50 }, Coord { x: -0.12, y: 51.51 });
//! let found = catalogue.candidates_in_box(&bbox, FilterSet::EMPTY)?;
//! assert_eq!(found.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ordering;
mod persist;

use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use camino::Utf8PathBuf;
use geo::Rect;
use log::debug;
use promenade_core::{
    Category, FilterSet, PathSelector, Point, PointOfInterest, SelectorError, Tags,
};
use rusqlite::{Connection, Row, Transaction, params_from_iter, types::Value};
use thiserror::Error;

pub use persist::persist_pois_to_sqlite;

/// Default cap on the number of stops in a tour.
pub const DEFAULT_MAX_STOPS: usize = 8;

/// Default corridor half width as a fraction of the direct distance.
pub const DEFAULT_CORRIDOR_RATIO: f64 = 0.25;

/// Errors raised while opening or writing the catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open POI catalogue at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Beginning or committing a transaction failed.
    #[error("POI catalogue transaction failed")]
    Transaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the table or preparing a statement failed.
    #[error("failed to prepare the pois table")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A POI identifier could not be represented as an SQLite integer.
    #[error("POI id {poi_id} exceeds SQLite i64 range")]
    PoiIdOutOfRange {
        /// Identifier that failed the conversion.
        poi_id: u64,
    },
    /// Serialising POI tags to JSON failed.
    #[error("failed to serialise tags for POI {poi_id}")]
    Tags {
        /// Identifier of the POI whose tags failed to serialise.
        poi_id: u64,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Writing a POI row failed.
    #[error("failed to persist POI {poi_id}")]
    PersistRow {
        /// Identifier of the POI being persisted.
        poi_id: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// A catalogue row that could not be turned back into a POI.
#[derive(Debug, Error)]
#[error("POI row {id} is corrupt: {message}")]
struct CorruptRow {
    id: i64,
    message: String,
}

/// Tunables for the ordering heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogueConfig {
    /// Most stops a tour visits.
    pub max_stops: usize,
    /// Corridor half width for direct tours, as a fraction of the distance
    /// between the endpoints.
    pub corridor_ratio: f64,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            max_stops: DEFAULT_MAX_STOPS,
            corridor_ratio: DEFAULT_CORRIDOR_RATIO,
        }
    }
}

impl CatalogueConfig {
    /// Set the stop cap.
    #[must_use]
    pub const fn with_max_stops(mut self, max_stops: usize) -> Self {
        self.max_stops = max_stops;
        self
    }

    /// Set the corridor ratio.
    #[must_use]
    pub const fn with_corridor_ratio(mut self, ratio: f64) -> Self {
        self.corridor_ratio = ratio;
        self
    }
}

/// A [`PathSelector`] reading POIs from SQLite.
pub struct SqlitePoiCatalogue {
    connection: Mutex<Connection>,
    config: CatalogueConfig,
}

impl std::fmt::Debug for SqlitePoiCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePoiCatalogue")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqlitePoiCatalogue {
    /// Open the catalogue at `path`, creating the `pois` table when missing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Open`] when the file cannot be opened and
    /// [`CatalogueError::Schema`] when the table cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogueError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| CatalogueError::Open {
            path: display_path(path),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Open an empty catalogue held in memory.
    ///
    /// # Errors
    ///
    /// As [`Self::open`].
    pub fn open_in_memory() -> Result<Self, CatalogueError> {
        let connection =
            Connection::open_in_memory().map_err(|source| CatalogueError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Wrap an open connection, creating the `pois` table when missing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] when the table cannot be created.
    pub fn from_connection(mut connection: Connection) -> Result<Self, CatalogueError> {
        let transaction = connection
            .transaction()
            .map_err(|source| CatalogueError::Transaction { source })?;
        create_schema(&transaction)?;
        transaction
            .commit()
            .map_err(|source| CatalogueError::Transaction { source })?;
        Ok(Self {
            connection: Mutex::new(connection),
            config: CatalogueConfig::default(),
        })
    }

    /// Replace the ordering configuration.
    #[must_use]
    pub const fn with_config(mut self, config: CatalogueConfig) -> Self {
        self.config = config;
        self
    }

    /// The active ordering configuration.
    #[must_use]
    pub const fn config(&self) -> CatalogueConfig {
        self.config
    }

    /// Insert or replace `pois` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] when any row cannot be written; nothing is
    /// committed on error.
    pub fn insert_pois(&self, pois: &[PointOfInterest]) -> Result<(), CatalogueError> {
        let mut connection = self.connection();
        let transaction = connection
            .transaction()
            .map_err(|source| CatalogueError::Transaction { source })?;
        persist::persist_rows(&transaction, pois)?;
        transaction
            .commit()
            .map_err(|source| CatalogueError::Transaction { source })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn query_box(
        &self,
        bbox: &Rect<f64>,
        filters: FilterSet,
        limit: Option<usize>,
    ) -> Result<Vec<PointOfInterest>, SelectorError> {
        let (min, max) = (bbox.min(), bbox.max());
        let mut params = vec![
            Value::Real(min.x),
            Value::Real(max.x),
            Value::Real(min.y),
            Value::Real(max.y),
        ];
        let mut sql = String::from(
            "SELECT id, lon, lat, category, tags FROM pois
             WHERE lon BETWEEN ?1 AND ?2 AND lat BETWEEN ?3 AND ?4",
        );
        if !filters.is_empty() {
            let placeholders: Vec<String> = filters
                .iter()
                .map(|category| {
                    params.push(Value::Text(category.as_str().to_owned()));
                    format!("?{}", params.len())
                })
                .collect();
            sql.push_str(&format!(" AND category IN ({})", placeholders.join(", ")));
        }
        match limit {
            Some(limit) => {
                params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
                sql.push_str(&format!(" ORDER BY RANDOM() LIMIT ?{}", params.len()));
            }
            None => sql.push_str(" ORDER BY id"),
        }

        let connection = self.connection();
        let mut statement = connection.prepare(&sql).map_err(SelectorError::query)?;
        let rows = statement
            .query_map(params_from_iter(params), PoiRow::read)
            .map_err(SelectorError::query)?;
        let pois = rows
            .map(|row| {
                row.map_err(SelectorError::query)
                    .and_then(|raw| raw.into_poi().map_err(SelectorError::query))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("catalogue returned {} POIs", pois.len());
        Ok(pois)
    }
}

impl PathSelector for SqlitePoiCatalogue {
    fn candidates_in_box(
        &self,
        bbox: &Rect<f64>,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError> {
        self.query_box(bbox, filters, None)
    }

    fn random_sample(
        &self,
        bbox: &Rect<f64>,
        max_count: usize,
        filters: FilterSet,
    ) -> Result<Vec<PointOfInterest>, SelectorError> {
        self.query_box(bbox, filters, Some(max_count))
    }

    fn order_for_direct_path(
        &self,
        start: Point,
        finish: Point,
        candidates: Vec<PointOfInterest>,
    ) -> Vec<PointOfInterest> {
        ordering::order_along_corridor(
            start,
            finish,
            candidates,
            self.config.corridor_ratio,
            self.config.max_stops,
        )
    }

    fn order_for_round_path(
        &self,
        center: Point,
        radius_m: u32,
        candidates: Vec<PointOfInterest>,
    ) -> Vec<PointOfInterest> {
        ordering::order_around_center(center, radius_m, candidates, self.config.max_stops)
    }
}

pub(crate) fn create_schema(transaction: &Transaction<'_>) -> Result<(), CatalogueError> {
    transaction
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS pois (
                id INTEGER PRIMARY KEY,
                lon REAL NOT NULL,
                lat REAL NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_pois_lon_lat ON pois (lon, lat);",
        )
        .map_err(|source| CatalogueError::Schema { source })
}

fn display_path(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from(path.to_string_lossy().into_owned())
}

struct PoiRow {
    id: i64,
    lon: f64,
    lat: f64,
    category: String,
    tags: String,
}

impl PoiRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            lon: row.get(1)?,
            lat: row.get(2)?,
            category: row.get(3)?,
            tags: row.get(4)?,
        })
    }

    fn into_poi(self) -> Result<PointOfInterest, CorruptRow> {
        let row_id = self.id;
        let corrupt = |message: String| CorruptRow {
            id: row_id,
            message,
        };
        let id = u64::try_from(self.id).map_err(|err| corrupt(err.to_string()))?;
        let category: Category = self
            .category
            .parse()
            .map_err(|err: promenade_core::ParseCategoryError| corrupt(err.to_string()))?;
        let tags: Tags =
            serde_json::from_str(&self.tags).map_err(|err| corrupt(err.to_string()))?;
        Ok(PointOfInterest::new(
            id,
            Point::new(self.lat, self.lon),
            category,
            tags,
        ))
    }
}
