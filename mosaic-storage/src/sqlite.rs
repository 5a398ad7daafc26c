//! SQLite-backed `RecordPersistence` implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::debug;

use mosaic_core::errors::{MosaicResult, StoreError};
use mosaic_core::models::{EmbeddingRecord, ProjectManifest};
use mosaic_core::traits::RecordPersistence;

use crate::codec::{bytes_to_vector, vector_to_bytes};
use crate::{schema, to_sqlite_err};

/// Durable record store keyed by `"{project}|{path}"`.
///
/// A single connection behind a `Mutex`: the store is only ever driven
/// from the orchestrating context, so there is no contention to pool
/// away.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> MosaicResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_sqlite_err(e.to_string()))?;
        Self::initialize(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> MosaicResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_sqlite_err(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> MosaicResult<Self> {
        schema::apply_pragmas(&conn)?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn composite_key(project: &str, path: &str) -> String {
        format!("{project}|{path}")
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> MosaicResult<T>,
    ) -> MosaicResult<T> {
        let conn = self.conn.lock().map_err(|e| {
            StoreError::SqliteError {
                message: format!("connection lock poisoned: {e}"),
            }
        })?;
        f(&conn)
    }

    fn upsert_record(
        conn: &Connection,
        project: &str,
        record: &EmbeddingRecord,
    ) -> MosaicResult<()> {
        conn.execute(
            "INSERT INTO embedding_records (composite_key, project, path, vector, dimensions)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(composite_key) DO UPDATE SET
                vector = excluded.vector,
                dimensions = excluded.dimensions",
            params![
                Self::composite_key(project, &record.path),
                project,
                record.path,
                vector_to_bytes(&record.vector),
                record.vector.len() as i64,
            ],
        )
        .map_err(|e| to_sqlite_err(e.to_string()))?;
        Ok(())
    }
}

impl RecordPersistence for SqliteStore {
    fn put(&self, project: &str, record: &EmbeddingRecord) -> MosaicResult<()> {
        self.with_conn(|conn| Self::upsert_record(conn, project, record))
    }

    fn put_many(&self, project: &str, records: &[EmbeddingRecord]) -> MosaicResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch("BEGIN")
                .map_err(|e| to_sqlite_err(e.to_string()))?;
            for record in records {
                if let Err(e) = Self::upsert_record(conn, project, record) {
                    let _ = conn.execute_batch("ROLLBACK");
                    return Err(e);
                }
            }
            conn.execute_batch("COMMIT")
                .map_err(|e| to_sqlite_err(e.to_string()))?;
            debug!(project, count = records.len(), "records persisted");
            Ok(())
        })
    }

    fn records_for(&self, project: &str) -> MosaicResult<Vec<EmbeddingRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT path, vector FROM embedding_records
                     WHERE project = ?1 ORDER BY composite_key",
                )
                .map_err(|e| to_sqlite_err(e.to_string()))?;

            let rows = stmt
                .query_map(params![project], |row| {
                    let path: String = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    Ok((path, blob))
                })
                .map_err(|e| to_sqlite_err(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                let (path, blob) = row.map_err(|e| to_sqlite_err(e.to_string()))?;
                records.push(EmbeddingRecord::new(path, bytes_to_vector(&blob)));
            }
            Ok(records)
        })
    }

    fn put_manifest(&self, project: &str, manifest: &ProjectManifest) -> MosaicResult<()> {
        let excluded = serde_json::to_string(&manifest.excluded_images).map_err(|e| {
            StoreError::PersistenceFailed {
                reason: format!("manifest encode: {e}"),
            }
        })?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO project_manifests
                    (project, processed_count, total_images_found, excluded_images, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(project) DO UPDATE SET
                    processed_count = excluded.processed_count,
                    total_images_found = excluded.total_images_found,
                    excluded_images = excluded.excluded_images,
                    last_updated = excluded.last_updated",
                params![
                    project,
                    manifest.processed_count as i64,
                    manifest.total_images_found as i64,
                    excluded,
                    manifest.last_updated,
                ],
            )
            .map_err(|e| to_sqlite_err(e.to_string()))?;
            Ok(())
        })
    }

    fn manifest_for(&self, project: &str) -> MosaicResult<Option<ProjectManifest>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT processed_count, total_images_found, excluded_images, last_updated
                     FROM project_manifests WHERE project = ?1",
                    params![project],
                    |row| {
                        let processed: i64 = row.get(0)?;
                        let total: i64 = row.get(1)?;
                        let excluded: String = row.get(2)?;
                        let updated: i64 = row.get(3)?;
                        Ok((processed, total, excluded, updated))
                    },
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(to_sqlite_err(other.to_string())),
                })?;

            let Some((processed, total, excluded, updated)) = row else {
                return Ok(None);
            };

            // A manifest that fails to decode is treated as no prior
            // session rather than an error.
            let excluded_images: Vec<String> = match serde_json::from_str(&excluded) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!(project, error = %e, "corrupt manifest, starting fresh");
                    return Ok(None);
                }
            };

            Ok(Some(ProjectManifest {
                processed_count: processed.max(0) as usize,
                total_images_found: total.max(0) as usize,
                excluded_images,
                last_updated: updated,
            }))
        })
    }
}
