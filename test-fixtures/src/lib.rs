//! Shared test helpers: deterministic synthetic embeddings and stub
//! implementations of the external collaborator traits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mosaic_core::errors::{EmbeddingError, MosaicResult};
use mosaic_core::models::{
    ClusterSet, EmbeddingRecord, ImagePixels, PipelineStats, ProjectManifest,
};
use mosaic_core::traits::{
    ImageHandle, ImageScanner, PresentationSink, RecordPersistence, VisionEmbedder,
};

/// Build a record from a path and vector.
pub fn record(path: &str, vector: Vec<f32>) -> EmbeddingRecord {
    EmbeddingRecord::new(path, vector)
}

/// Deterministic jitter in [-amount, amount], varying by index and axis.
fn jitter(index: usize, axis: usize, amount: f32) -> f32 {
    // Small LCG keyed on (index, axis); avoids pulling a RNG into fixtures.
    let seed = (index as u64).wrapping_mul(6364136223846793005).wrapping_add(axis as u64);
    let x = (seed >> 33) as f32 / (u32::MAX >> 2) as f32;
    (x - 1.0) * amount
}

/// `n` records scattered around `center`, paths `"{prefix}{i}"`.
pub fn region(prefix: &str, center: &[f32], n: usize, amount: f32) -> Vec<EmbeddingRecord> {
    (0..n)
        .map(|i| {
            let vector = center
                .iter()
                .enumerate()
                .map(|(axis, &c)| c + jitter(i, axis, amount))
                .collect();
            EmbeddingRecord::new(format!("{prefix}{i}"), vector)
        })
        .collect()
}

/// A solid-color decoded image.
pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> ImagePixels {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..width * height {
        rgb.extend_from_slice(&color);
    }
    ImagePixels::new(width, height, rgb)
}

/// Scanner over an in-memory list of (path, pixels) pairs.
pub struct StubScanner {
    images: Vec<(String, ImagePixels)>,
}

impl StubScanner {
    pub fn new(images: Vec<(String, ImagePixels)>) -> Self {
        Self { images }
    }
}

struct StubHandle {
    path: String,
    pixels: ImagePixels,
}

impl ImageHandle for StubHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn open(&self) -> MosaicResult<ImagePixels> {
        Ok(self.pixels.clone())
    }
}

impl ImageScanner for StubScanner {
    fn scan(&self) -> MosaicResult<Vec<Box<dyn ImageHandle>>> {
        Ok(self
            .images
            .iter()
            .map(|(path, pixels)| {
                Box::new(StubHandle {
                    path: path.clone(),
                    pixels: pixels.clone(),
                }) as Box<dyn ImageHandle>
            })
            .collect())
    }
}

/// Embedder that projects each image onto its mean color, or fails on
/// command. Solid red/green/blue images land on the first three axes.
pub struct StubEmbedder {
    dimensions: usize,
    fail: bool,
}

impl StubEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: false,
        }
    }

    pub fn failing(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail: true,
        }
    }

    fn project(&self, image: &ImagePixels) -> Vec<f32> {
        let mut sums = [0.0f64; 3];
        for pixel in image.rgb.chunks_exact(3) {
            for (channel, &value) in pixel.iter().enumerate() {
                sums[channel] += value as f64;
            }
        }
        let count = image.pixel_count().max(1) as f64;
        let mut vector = vec![0.0f32; self.dimensions];
        for (channel, sum) in sums.iter().enumerate() {
            if channel < self.dimensions {
                vector[channel] = (sum / count / 255.0) as f32;
            }
        }
        vector
    }
}

impl VisionEmbedder for StubEmbedder {
    fn embed_batch(&self, images: &[ImagePixels]) -> MosaicResult<Vec<Vec<f32>>> {
        if self.fail {
            return Err(EmbeddingError::InferenceFailed {
                reason: "stub embedder configured to fail".to_string(),
            }
            .into());
        }
        Ok(images.iter().map(|i| self.project(i)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        !self.fail
    }
}

/// In-memory `RecordPersistence`, optionally failing on demand.
///
/// Clones share state, so a test can keep one handle while the store
/// owns another.
#[derive(Default, Clone)]
pub struct MemoryPersistence {
    records: Arc<Mutex<HashMap<String, EmbeddingRecord>>>,
    manifests: Arc<Mutex<HashMap<String, ProjectManifest>>>,
    fail_puts: Arc<Mutex<bool>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent puts fail (for recoverability tests).
    pub fn set_failing(&self, failing: bool) {
        *self.fail_puts.lock().unwrap() = failing;
    }

    fn key(project: &str, path: &str) -> String {
        format!("{project}|{path}")
    }

    fn check_failure(&self) -> MosaicResult<()> {
        if *self.fail_puts.lock().unwrap() {
            return Err(mosaic_core::errors::StoreError::PersistenceFailed {
                reason: "memory backend configured to fail".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl RecordPersistence for MemoryPersistence {
    fn put(&self, project: &str, record: &EmbeddingRecord) -> MosaicResult<()> {
        self.check_failure()?;
        self.records
            .lock()
            .unwrap()
            .insert(Self::key(project, &record.path), record.clone());
        Ok(())
    }

    fn put_many(&self, project: &str, records: &[EmbeddingRecord]) -> MosaicResult<()> {
        self.check_failure()?;
        let mut map = self.records.lock().unwrap();
        for record in records {
            map.insert(Self::key(project, &record.path), record.clone());
        }
        Ok(())
    }

    fn records_for(&self, project: &str) -> MosaicResult<Vec<EmbeddingRecord>> {
        let prefix = format!("{project}|");
        let map = self.records.lock().unwrap();
        let mut keyed: Vec<(&String, &EmbeddingRecord)> =
            map.iter().filter(|(k, _)| k.starts_with(&prefix)).collect();
        keyed.sort_by(|a, b| a.0.cmp(b.0));
        Ok(keyed.into_iter().map(|(_, r)| r.clone()).collect())
    }

    fn put_manifest(&self, project: &str, manifest: &ProjectManifest) -> MosaicResult<()> {
        self.check_failure()?;
        self.manifests
            .lock()
            .unwrap()
            .insert(project.to_string(), manifest.clone());
        Ok(())
    }

    fn manifest_for(&self, project: &str) -> MosaicResult<Option<ProjectManifest>> {
        Ok(self.manifests.lock().unwrap().get(project).cloned())
    }
}

/// Sink that records every render and stats notification.
#[derive(Default)]
pub struct CollectingSink {
    renders: Mutex<Vec<ClusterSet>>,
    stats: Mutex<Vec<PipelineStats>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<ClusterSet> {
        self.renders.lock().unwrap().clone()
    }

    pub fn last_render(&self) -> Option<ClusterSet> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn stats(&self) -> Vec<PipelineStats> {
        self.stats.lock().unwrap().clone()
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

impl PresentationSink for CollectingSink {
    fn render(&self, clusters: &ClusterSet) {
        self.renders.lock().unwrap().push(clusters.clone());
    }

    fn notify_stats(&self, stats: &PipelineStats) {
        self.stats.lock().unwrap().push(stats.clone());
    }
}
