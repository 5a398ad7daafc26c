use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Clustering subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Number of clusters, at least 2.
    pub k: usize,
    /// Cosine-distance dedup threshold for representatives, in [0, 1].
    pub threshold: f64,
    /// Lloyd's iteration cap.
    pub iteration_cap: usize,
    /// Representatives per cluster. The freeze contract requires the
    /// default of 16.
    pub representatives_per_cluster: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: defaults::DEFAULT_K,
            threshold: defaults::DEFAULT_THRESHOLD,
            iteration_cap: defaults::DEFAULT_ITERATION_CAP,
            representatives_per_cluster: defaults::DEFAULT_REPRESENTATIVES,
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k < 2 {
            return Err(ConfigError::KTooSmall { k: self.k });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                threshold: self.threshold,
            });
        }
        if self.iteration_cap == 0 {
            return Err(ConfigError::ZeroField {
                field: "iteration_cap",
            });
        }
        if self.representatives_per_cluster == 0 {
            return Err(ConfigError::ZeroField {
                field: "representatives_per_cluster",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ClusteringConfig::default().validate().is_ok());
    }

    #[test]
    fn k_below_two_rejected() {
        let config = ClusteringConfig {
            k: 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::KTooSmall { k: 1 })));
    }

    #[test]
    fn threshold_above_one_rejected() {
        let config = ClusteringConfig {
            threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn boundary_thresholds_accepted() {
        for threshold in [0.0, 1.0] {
            let config = ClusteringConfig {
                threshold,
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "threshold {threshold} should be valid");
        }
    }
}
