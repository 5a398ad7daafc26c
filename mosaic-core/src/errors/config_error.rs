/// Configuration validation errors, raised at construction time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("k must be at least 2, got {k}")]
    KTooSmall { k: usize },

    #[error("threshold must be within [0, 1], got {threshold}")]
    ThresholdOutOfRange { threshold: f64 },

    #[error("{field} must be non-zero")]
    ZeroField { field: &'static str },

    #[error("project name must not be empty")]
    EmptyProject,
}
