//! # mosaic-embeddings
//!
//! Vision embedding generation: an ONNX provider for real models, a
//! deterministic pixel-hash fallback, and an engine that fronts either
//! with a content-hash cache.

pub mod cache;
pub mod engine;
pub mod providers;

pub use engine::EmbeddingEngine;
pub use providers::{create_provider, OnnxVisionProvider, PixelHashProvider};
