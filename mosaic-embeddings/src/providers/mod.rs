//! Embedding providers.

mod onnx_provider;
mod pixel_hash;

pub use onnx_provider::OnnxVisionProvider;
pub use pixel_hash::PixelHashProvider;

use tracing::warn;

use mosaic_core::config::EmbeddingConfig;
use mosaic_core::traits::VisionEmbedder;

/// Build the provider named by the config. A failed ONNX load falls
/// back to the pixel-hash provider so a session can always start.
pub fn create_provider(config: &EmbeddingConfig) -> Box<dyn VisionEmbedder> {
    match (config.provider.as_str(), config.model_path.as_deref()) {
        ("onnx", Some(model_path)) => {
            match OnnxVisionProvider::load(model_path, config.dimensions) {
                Ok(provider) => Box::new(provider),
                Err(e) => {
                    warn!(error = %e, "ONNX provider unavailable, using pixel-hash fallback");
                    Box::new(PixelHashProvider::new(config.dimensions))
                }
            }
        }
        ("onnx", None) => {
            warn!("onnx provider selected without model_path, using pixel-hash fallback");
            Box::new(PixelHashProvider::new(config.dimensions))
        }
        _ => Box::new(PixelHashProvider::new(config.dimensions)),
    }
}
