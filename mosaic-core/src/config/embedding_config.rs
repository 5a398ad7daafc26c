use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Embedding subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider id: "onnx" or "pixel-hash".
    pub provider: String,
    /// Path to the ONNX vision model, when the provider is "onnx".
    pub model_path: Option<String>,
    /// Embedding output width. Fixed per session at first use.
    pub dimensions: usize,
    /// L1 cache capacity in entries.
    pub l1_cache_size: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "pixel-hash".to_string(),
            model_path: None,
            dimensions: defaults::DEFAULT_DIMENSIONS,
            l1_cache_size: defaults::DEFAULT_L1_CACHE_SIZE,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dimensions == 0 {
            return Err(ConfigError::ZeroField { field: "dimensions" });
        }
        Ok(())
    }
}
