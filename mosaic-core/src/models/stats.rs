use serde::{Deserialize, Serialize};

/// Progress snapshot pushed to the presentation surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub processed: usize,
    pub total: usize,
    pub speed_sec_per_image: f64,
    pub eta_millis: i64,
    pub current_action: String,
    pub completed: bool,
}
