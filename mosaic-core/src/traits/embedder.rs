use crate::errors::MosaicResult;
use crate::models::ImagePixels;

/// Vision embedding provider.
///
/// Implementations are not assumed thread-safe; the inference worker
/// owns its provider exclusively and serializes calls.
pub trait VisionEmbedder: Send {
    /// Embed a batch of decoded images. The output is positionally
    /// aligned with the input, one vector per image.
    fn embed_batch(&self, images: &[ImagePixels]) -> MosaicResult<Vec<Vec<f32>>>;

    /// The dimensionality of vectors produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider is currently usable.
    fn is_available(&self) -> bool;
}
