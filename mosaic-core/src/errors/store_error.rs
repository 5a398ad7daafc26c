/// Store-layer errors: the in-memory record map and its SQLite backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization to the durable backend failed. Recoverable: the
    /// in-memory view is intact and the next flush retries the snapshot.
    #[error("persistence failed: {reason}")]
    PersistenceFailed { reason: String },

    /// An embedding's width disagrees with the session dimension.
    /// Fatal for the session.
    #[error("embedding dimension mismatch: expected {expected}, got {actual} for {path}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        path: String,
    },

    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },
}
