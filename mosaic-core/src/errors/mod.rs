//! Error types for every Mosaic subsystem.
//!
//! Each subsystem has its own `thiserror` enum; `MosaicError` composes
//! them for callers that cross subsystem boundaries.

mod config_error;
mod embedding_error;
mod freeze_error;
mod store_error;

pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use freeze_error::FreezeError;
pub use store_error::StoreError;

/// Top-level error for the Mosaic engine.
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Freeze(#[from] FreezeError),

    #[error("scanner failed: {reason}")]
    ScanFailed { reason: String },

    #[error("image decode failed for {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("pipeline channel closed: {context}")]
    ChannelClosed { context: String },
}

/// Convenience alias used across the workspace.
pub type MosaicResult<T> = Result<T, MosaicError>;
