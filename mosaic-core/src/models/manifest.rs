use serde::{Deserialize, Serialize};

/// Per-project progress manifest, stored as a single value alongside
/// the embedding records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub processed_count: usize,
    pub total_images_found: usize,
    pub excluded_images: Vec<String>,
    /// Unix millis of the last persist.
    pub last_updated: i64,
}
