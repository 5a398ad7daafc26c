//! Deterministic pixel-hash fallback provider.
//!
//! Projects a quantized color-and-position histogram into fixed
//! dimension buckets. Not as semantically rich as a neural model, but
//! always available and stable across runs.

use mosaic_core::errors::MosaicResult;
use mosaic_core::models::ImagePixels;
use mosaic_core::traits::VisionEmbedder;

/// Color quantization: channel values collapse into this many levels.
const COLOR_LEVELS: u64 = 4;

/// Spatial quantization: the image splits into this many cells per axis.
const GRID_CELLS: u32 = 3;

pub struct PixelHashProvider {
    dimensions: usize,
}

impl PixelHashProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Hash a (color, position) term into a bucket index using FNV-1a.
    fn hash_term(term: u64, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.to_le_bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h as usize) % dims
    }

    fn project(&self, image: &ImagePixels) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimensions];
        if image.rgb.is_empty() {
            return vec;
        }

        let step = 256 / COLOR_LEVELS;
        for (index, pixel) in image.rgb.chunks_exact(3).enumerate() {
            let x = index as u32 % image.width;
            let y = index as u32 / image.width;
            let cell_x = (x * GRID_CELLS / image.width.max(1)).min(GRID_CELLS - 1) as u64;
            let cell_y = (y * GRID_CELLS / image.height.max(1)).min(GRID_CELLS - 1) as u64;

            let r = pixel[0] as u64 / step;
            let g = pixel[1] as u64 / step;
            let b = pixel[2] as u64 / step;
            let term = (((r * COLOR_LEVELS + g) * COLOR_LEVELS + b) * GRID_CELLS as u64
                + cell_x)
                * GRID_CELLS as u64
                + cell_y;

            vec[Self::hash_term(term, self.dimensions)] += 1.0;
        }

        // Normalize by pixel count, then L2.
        let count = image.pixel_count() as f32;
        for v in &mut vec {
            *v /= count;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl VisionEmbedder for PixelHashProvider {
    fn embed_batch(&self, images: &[ImagePixels]) -> MosaicResult<Vec<Vec<f32>>> {
        Ok(images.iter().map(|i| self.project(i)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "pixel-hash"
    }

    fn is_available(&self) -> bool {
        true
    }
}
