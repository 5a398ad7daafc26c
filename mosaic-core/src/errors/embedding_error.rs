/// Embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("failed to load model from {path}: {reason}")]
    ModelLoadFailed { path: String, reason: String },

    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    /// The provider returned a different number of vectors than images.
    #[error("batch shape mismatch: {images} images in, {vectors} vectors out")]
    BatchShapeMismatch { images: usize, vectors: usize },
}
