//! # mosaic-core
//!
//! Foundation crate for the Mosaic image grouping engine.
//! Defines all shared types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::MosaicConfig;
pub use errors::{MosaicError, MosaicResult};
pub use models::{Cluster, ClusterSet, EmbeddingRecord, ImagePixels, Representative};
