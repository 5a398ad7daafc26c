//! Schema setup: pragmas and `user_version` migrations.

use rusqlite::Connection;

use mosaic_core::errors::{MosaicResult, StoreError};

use crate::to_sqlite_err;

/// Apply performance and safety pragmas to a connection.
pub fn apply_pragmas(conn: &Connection) -> MosaicResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(|e| to_sqlite_err(e.to_string()))?;
    Ok(())
}

/// Run all pending migrations on a connection.
pub fn run_migrations(conn: &Connection) -> MosaicResult<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_sqlite_err(e.to_string()))?;

    if version < 1 {
        migrate_v1(conn).map_err(|e| StoreError::MigrationFailed {
            version: 1,
            reason: e.to_string(),
        })?;
        conn.pragma_update(None, "user_version", 1)
            .map_err(|e| to_sqlite_err(e.to_string()))?;
    }

    Ok(())
}

/// v1: embedding records keyed by `"{project}|{path}"`, one manifest
/// row per project.
fn migrate_v1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS embedding_records (
            composite_key TEXT PRIMARY KEY,
            project       TEXT NOT NULL,
            path          TEXT NOT NULL,
            vector        BLOB NOT NULL,
            dimensions    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_project ON embedding_records(project);

        CREATE TABLE IF NOT EXISTS project_manifests (
            project            TEXT PRIMARY KEY,
            processed_count    INTEGER NOT NULL DEFAULT 0,
            total_images_found INTEGER NOT NULL DEFAULT 0,
            excluded_images    TEXT NOT NULL DEFAULT '[]',
            last_updated       INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
}
