//! L1 in-memory embedding cache keyed by pixel content hash.

use std::time::Duration;

use moka::sync::Cache;

use mosaic_core::models::ImagePixels;

/// Blake3 hash of an image's pixel content (and geometry).
pub fn content_hash(image: &ImagePixels) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&image.width.to_le_bytes());
    hasher.update(&image.height.to_le_bytes());
    hasher.update(&image.rgb);
    hasher.finalize().to_hex().to_string()
}

/// In-memory embedding cache. Re-scanning a folder re-decodes the same
/// pixels; the cache spares the model a second pass over them.
pub struct EmbeddingCache {
    cache: Cache<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self { cache }
    }

    pub fn get(&self, hash: &str) -> Option<Vec<f32>> {
        self.cache.get(hash)
    }

    pub fn insert(&self, hash: String, embedding: Vec<f32>) {
        self.cache.insert(hash, embedding);
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
