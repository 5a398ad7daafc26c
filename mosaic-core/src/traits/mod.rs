//! Trait seams to the external collaborators: folder scanning, the
//! vision model, durable persistence, and the presentation surface.

mod embedder;
mod persistence;
mod presentation;
mod scanner;

pub use embedder::VisionEmbedder;
pub use persistence::RecordPersistence;
pub use presentation::PresentationSink;
pub use scanner::{ImageHandle, ImageScanner};
