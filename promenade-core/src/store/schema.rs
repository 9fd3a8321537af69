//! Schema for the `routes` table.

use rusqlite::{OptionalExtension, Transaction};

use super::sqlite::SqliteRouteStoreError;

/// Version recorded in `routes_schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Create the routes schema and record its version.
///
/// Every statement is idempotent. An existing database with a different
/// version is rejected rather than altered.
pub(super) fn initialise_schema(
    transaction: &Transaction<'_>,
) -> Result<(), SqliteRouteStoreError> {
    run_migration_step(
        transaction,
        "create routes",
        "CREATE TABLE IF NOT EXISTS routes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK (kind IN ('direct', 'round')),
            start_lat REAL NOT NULL,
            start_lon REAL NOT NULL,
            finish_lat REAL,
            finish_lon REAL,
            radius INTEGER CHECK (radius IS NULL OR radius > 0),
            key_start_lat INTEGER NOT NULL,
            key_start_lon INTEGER NOT NULL,
            key_finish_lat INTEGER,
            key_finish_lon INTEGER,
            filters INTEGER NOT NULL,
            length REAL NOT NULL,
            duration INTEGER NOT NULL,
            pois TEXT NOT NULL,
            points TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            popularity INTEGER NOT NULL DEFAULT 0,
            derived_from INTEGER REFERENCES routes(id)
        )",
    )?;
    run_migration_step(
        transaction,
        "index direct route keys",
        "CREATE INDEX IF NOT EXISTS idx_routes_direct_key
            ON routes(key_start_lat, key_start_lon, key_finish_lat, key_finish_lon, filters)
            WHERE kind = 'direct' AND derived_from IS NULL",
    )?;
    run_migration_step(
        transaction,
        "index round route keys",
        "CREATE INDEX IF NOT EXISTS idx_routes_round_key
            ON routes(key_start_lat, key_start_lon, radius, filters)
            WHERE kind = 'round' AND derived_from IS NULL",
    )?;
    ensure_schema_version(transaction)
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SqliteRouteStoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS routes_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM routes_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SqliteRouteStoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SqliteRouteStoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO routes_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SqliteRouteStoreError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SqliteRouteStoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SqliteRouteStoreError::Migration { step, source })
}
