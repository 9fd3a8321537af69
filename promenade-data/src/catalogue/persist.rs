//! Bulk loading of points of interest into a catalogue database file.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::info;
use promenade_core::PointOfInterest;
use rusqlite::{Connection, Transaction};

use super::{CatalogueError, create_schema};

/// Persist points of interest to a catalogue database on disk.
///
/// The function is idempotent: rows are replaced when identifiers already
/// exist. Parent directories are created automatically, and the `pois` table
/// is initialised if missing. Tags are serialised to JSON strings.
///
/// # Errors
///
/// Returns [`CatalogueError`] when the directory, database, schema or any
/// row cannot be written. Nothing is committed on error.
pub fn persist_pois_to_sqlite(
    path: &Utf8Path,
    pois: &[PointOfInterest],
) -> Result<(), CatalogueError> {
    ensure_parent_dir(path)?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| CatalogueError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| CatalogueError::Transaction { source })?;
    create_schema(&transaction)?;
    persist_rows(&transaction, pois)?;
    transaction
        .commit()
        .map_err(|source| CatalogueError::Transaction { source })?;

    info!("stored {} points of interest in {path}", pois.len());
    Ok(())
}

fn ensure_parent_dir(path: &Utf8Path) -> Result<(), CatalogueError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    base_dir
        .create_dir_all(&relative)
        .map_err(|source| CatalogueError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })
}

fn base_dir_and_relative(
    parent: &Utf8Path,
) -> Result<(fs_utf8::Dir, Utf8PathBuf), CatalogueError> {
    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };

    let dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority()).map_err(|source| {
        CatalogueError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        }
    })?;

    Ok((dir, relative.to_path_buf()))
}

pub(super) fn persist_rows(
    transaction: &Transaction<'_>,
    pois: &[PointOfInterest],
) -> Result<(), CatalogueError> {
    if pois.is_empty() {
        return Ok(());
    }

    let mut statement = transaction
        .prepare(
            "INSERT OR REPLACE INTO pois (id, lon, lat, category, tags)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|source| CatalogueError::Schema { source })?;

    for poi in pois {
        let poi_id = i64::try_from(poi.id)
            .map_err(|_| CatalogueError::PoiIdOutOfRange { poi_id: poi.id })?;
        let tags =
            serde_json::to_string(&poi.tags).map_err(|source| CatalogueError::Tags {
                poi_id: poi.id,
                source,
            })?;
        statement
            .execute((
                poi_id,
                poi.location.lon,
                poi.location.lat,
                poi.category.as_str(),
                tags,
            ))
            .map_err(|source| CatalogueError::PersistRow {
                poi_id: poi.id,
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promenade_core::{Category, Point};
    use rstest::rstest;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    #[rstest]
    fn creates_parent_directories_and_replaces_rows() {
        let dir = TempDir::new().expect("tempdir");
        let path = utf8_dir(&dir).join("nested/catalogue/pois.db");
        let first = PointOfInterest::with_empty_tags(7, Point::new(1.0, 2.0), Category::Park);
        let moved = PointOfInterest::with_empty_tags(7, Point::new(1.5, 2.5), Category::Art);

        persist_pois_to_sqlite(&path, &[first]).expect("first write");
        persist_pois_to_sqlite(&path, &[moved]).expect("second write");

        let connection = Connection::open(path.as_std_path()).expect("reopen");
        let (count, category, lat): (i64, String, f64) = connection
            .query_row(
                "SELECT COUNT(*), MAX(category), MAX(lat) FROM pois",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("query");
        assert_eq!(count, 1);
        assert_eq!(category, "art");
        assert!((lat - 1.5).abs() < f64::EPSILON);
    }

    #[rstest]
    fn rejects_ids_beyond_sqlite_range() {
        let dir = TempDir::new().expect("tempdir");
        let path = utf8_dir(&dir).join("pois.db");
        let poi = PointOfInterest::with_empty_tags(u64::MAX, Point::new(0.0, 0.0), Category::Food);

        let err = persist_pois_to_sqlite(&path, &[poi]).expect_err("id out of range");

        assert!(matches!(err, CatalogueError::PoiIdOutOfRange { .. }));
    }
}
