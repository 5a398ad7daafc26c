//! ONNX Runtime vision provider.
//!
//! Loads image encoder models via the `ort` crate (v2). Input is a
//! NCHW float tensor at 224x224; output is mean-pooled if spatial,
//! then L2-normalized.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use mosaic_core::errors::{EmbeddingError, MosaicResult};
use mosaic_core::models::ImagePixels;
use mosaic_core::traits::VisionEmbedder;

/// Model input edge length.
const INPUT_SIZE: usize = 224;

/// ONNX-based vision embedding provider.
///
/// The session requires `&mut self` for `run`, so it sits behind a
/// `Mutex`; the model is never assumed thread-safe and all inference
/// calls are serialized.
#[derive(Debug)]
pub struct OnnxVisionProvider {
    session: Mutex<Session>,
    dimensions: usize,
    model_name: String,
}

impl OnnxVisionProvider {
    /// Load an ONNX image encoder from the given path.
    ///
    /// # Errors
    /// Returns `EmbeddingError::ModelLoadFailed` if the model cannot be
    /// loaded.
    pub fn load(model_path: &str, dimensions: usize) -> MosaicResult<Self> {
        let path = Path::new(model_path);
        if !path.exists() {
            return Err(EmbeddingError::ModelLoadFailed {
                path: model_path.to_string(),
                reason: "model file not found".to_string(),
            }
            .into());
        }

        let session = Session::builder()
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                path: model_path.to_string(),
                reason: e.to_string(),
            })?
            .with_intra_threads(2)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                path: model_path.to_string(),
                reason: e.to_string(),
            })?
            .commit_from_file(model_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                path: model_path.to_string(),
                reason: e.to_string(),
            })?;

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx-vision")
            .to_string();

        debug!(model = %model_name, dims = dimensions, "ONNX vision model loaded");

        Ok(Self {
            session: Mutex::new(session),
            dimensions,
            model_name,
        })
    }

    /// Nearest-neighbor resample into the model's input plane, NCHW,
    /// channel values scaled to [0, 1].
    fn preprocess(image: &ImagePixels) -> Vec<f32> {
        let mut planes = vec![0.0f32; 3 * INPUT_SIZE * INPUT_SIZE];
        let (w, h) = (image.width.max(1) as usize, image.height.max(1) as usize);

        for y in 0..INPUT_SIZE {
            let src_y = y * h / INPUT_SIZE;
            for x in 0..INPUT_SIZE {
                let src_x = x * w / INPUT_SIZE;
                let src = (src_y * w + src_x) * 3;
                for channel in 0..3 {
                    let value = image.rgb.get(src + channel).copied().unwrap_or(0);
                    planes[channel * INPUT_SIZE * INPUT_SIZE + y * INPUT_SIZE + x] =
                        value as f32 / 255.0;
                }
            }
        }
        planes
    }

    /// Run one batched inference call.
    fn infer(&self, images: &[ImagePixels]) -> MosaicResult<Vec<Vec<f32>>> {
        if images.is_empty() {
            return Ok(vec![]);
        }
        let batch = images.len();

        let mut data = Vec::with_capacity(batch * 3 * INPUT_SIZE * INPUT_SIZE);
        for image in images {
            data.extend(Self::preprocess(image));
        }

        let input = Tensor::from_array((
            vec![
                batch as i64,
                3i64,
                INPUT_SIZE as i64,
                INPUT_SIZE as i64,
            ],
            data,
        ))
        .map_err(|e| EmbeddingError::InferenceFailed {
            reason: format!("tensor creation error: {e}"),
        })?;

        let mut session = self.session.lock().map_err(|e| {
            EmbeddingError::InferenceFailed {
                reason: format!("session lock poisoned: {e}"),
            }
        })?;

        let outputs =
            session
                .run(ort::inputs![input])
                .map_err(|e| EmbeddingError::InferenceFailed {
                    reason: e.to_string(),
                })?;

        let (_name, output) =
            outputs
                .iter()
                .next()
                .ok_or_else(|| EmbeddingError::InferenceFailed {
                    reason: "no output tensor".to_string(),
                })?;

        let (shape, data) = output.try_extract_tensor::<f32>().map_err(|e| {
            EmbeddingError::InferenceFailed {
                reason: format!("tensor extraction failed: {e}"),
            }
        })?;

        let embeddings = match shape.len() {
            // [batch, dims] — already pooled.
            2 => {
                let dims = shape[1] as usize;
                (0..batch)
                    .map(|i| data[i * dims..(i + 1) * dims].to_vec())
                    .collect::<Vec<_>>()
            }
            // [batch, tokens, dims] — mean pool across tokens.
            3 => {
                let tokens = shape[1] as usize;
                let dims = shape[2] as usize;
                (0..batch)
                    .map(|i| {
                        let mut pooled = vec![0.0f32; dims];
                        for t in 0..tokens {
                            let row = &data[(i * tokens + t) * dims..(i * tokens + t + 1) * dims];
                            for (slot, &v) in pooled.iter_mut().zip(row) {
                                *slot += v;
                            }
                        }
                        for v in &mut pooled {
                            *v /= tokens as f32;
                        }
                        pooled
                    })
                    .collect()
            }
            _ => {
                return Err(EmbeddingError::InferenceFailed {
                    reason: format!("unexpected output shape: {shape:?}"),
                }
                .into())
            }
        };

        Ok(embeddings
            .into_iter()
            .map(|mut v| {
                let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > f32::EPSILON {
                    for x in &mut v {
                        *x /= norm;
                    }
                }
                v.resize(self.dimensions, 0.0);
                v
            })
            .collect())
    }
}

impl VisionEmbedder for OnnxVisionProvider {
    fn embed_batch(&self, images: &[ImagePixels]) -> MosaicResult<Vec<Vec<f32>>> {
        self.infer(images)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::solid_image;

    #[test]
    fn missing_model_is_a_load_error() {
        let err = OnnxVisionProvider::load("/no/such/model.onnx", 512).unwrap_err();
        assert!(err.to_string().contains("model file not found"));
    }

    #[test]
    fn preprocess_has_nchw_layout() {
        let planes = OnnxVisionProvider::preprocess(&solid_image(2, 2, [255, 0, 0]));
        assert_eq!(planes.len(), 3 * INPUT_SIZE * INPUT_SIZE);
        // Red plane is all ones, green and blue all zeros.
        assert!(planes[..INPUT_SIZE * INPUT_SIZE].iter().all(|&v| v == 1.0));
        assert!(planes[INPUT_SIZE * INPUT_SIZE..].iter().all(|&v| v == 0.0));
    }
}
