//! # mosaic-storage
//!
//! The authoritative embedding store: an in-memory map keyed by image
//! path with an exclusion set, backed by a SQLite record store that
//! persists across sessions.

pub mod codec;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use sqlite::SqliteStore;
pub use store::ImageStore;

use mosaic_core::errors::StoreError;

/// Shorthand for wrapping rusqlite failures.
pub(crate) fn to_sqlite_err(message: impl Into<String>) -> StoreError {
    StoreError::SqliteError {
        message: message.into(),
    }
}
