//! Closed configuration records for every subsystem.
//!
//! Every recognized option is an enumerated field; invalid combinations
//! are rejected by `validate` before a session starts.

mod clustering_config;
mod embedding_config;
mod producer_config;

pub mod defaults;

pub use clustering_config::ClusteringConfig;
pub use embedding_config::EmbeddingConfig;
pub use producer_config::ProducerConfig;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Top-level Mosaic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Project key that scopes persistence.
    pub project: String,
    pub clustering: ClusteringConfig,
    pub producer: ProducerConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            project: "default".to_string(),
            clustering: ClusteringConfig::default(),
            producer: ProducerConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl MosaicConfig {
    /// Validate the whole configuration tree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.is_empty() {
            return Err(ConfigError::EmptyProject);
        }
        self.clustering.validate()?;
        self.producer.validate()?;
        self.embedding.validate()?;
        Ok(())
    }
}
