use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Producer subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Embedding batch size.
    pub batch_size: usize,
    /// Flush cadence in newly produced records. May be changed mid-run;
    /// the next flush uses the new value.
    pub refresh_interval: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            refresh_interval: defaults::DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl ProducerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroField { field: "batch_size" });
        }
        if self.refresh_interval == 0 {
            return Err(ConfigError::ZeroField {
                field: "refresh_interval",
            });
        }
        Ok(())
    }
}
