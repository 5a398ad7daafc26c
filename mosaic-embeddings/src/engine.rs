//! EmbeddingEngine — fronts a provider with the content-hash cache.

use tracing::{debug, info};

use mosaic_core::config::EmbeddingConfig;
use mosaic_core::errors::{EmbeddingError, MosaicResult};
use mosaic_core::models::ImagePixels;
use mosaic_core::traits::VisionEmbedder;

use crate::cache::{content_hash, EmbeddingCache};
use crate::providers;

/// Caching front for a `VisionEmbedder`.
///
/// Batch calls look every image up by pixel hash first and only send
/// the misses to the underlying provider, preserving positional
/// correspondence in the output.
pub struct EmbeddingEngine {
    provider: Box<dyn VisionEmbedder>,
    cache: EmbeddingCache,
}

impl EmbeddingEngine {
    /// Create an engine from configuration.
    pub fn new(config: &EmbeddingConfig) -> Self {
        let provider = providers::create_provider(config);
        info!(
            provider = provider.name(),
            dims = provider.dimensions(),
            "embedding engine initialized"
        );
        Self {
            provider,
            cache: EmbeddingCache::new(config.l1_cache_size),
        }
    }

    /// Wrap an existing provider (used by tests and the pipeline).
    pub fn with_provider(provider: Box<dyn VisionEmbedder>, cache_size: u64) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(cache_size),
        }
    }
}

impl VisionEmbedder for EmbeddingEngine {
    fn embed_batch(&self, images: &[ImagePixels]) -> MosaicResult<Vec<Vec<f32>>> {
        let hashes: Vec<String> = images.iter().map(content_hash).collect();
        let mut results: Vec<Option<Vec<f32>>> =
            hashes.iter().map(|h| self.cache.get(h)).collect();

        let miss_indices: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| i)
            .collect();

        if !miss_indices.is_empty() {
            let misses: Vec<ImagePixels> =
                miss_indices.iter().map(|&i| images[i].clone()).collect();
            let fresh = self.provider.embed_batch(&misses)?;
            if fresh.len() != misses.len() {
                return Err(EmbeddingError::BatchShapeMismatch {
                    images: misses.len(),
                    vectors: fresh.len(),
                }
                .into());
            }
            for (&index, vector) in miss_indices.iter().zip(fresh) {
                self.cache.insert(hashes[index].clone(), vector.clone());
                results[index] = Some(vector);
            }
        }

        debug!(
            batch = images.len(),
            misses = miss_indices.len(),
            "batch embedded"
        );

        // Every slot was filled from the cache or the provider.
        Ok(results.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    fn name(&self) -> &str {
        self.provider.name()
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}
