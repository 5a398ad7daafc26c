use serde::{Deserialize, Serialize};

/// One embedded image: its path (the identity key) and the vector the
/// vision model produced for it. Created by the producer, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub path: String,
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    pub fn new(path: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            path: path.into(),
            vector,
        }
    }

    /// Embedding width.
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}
