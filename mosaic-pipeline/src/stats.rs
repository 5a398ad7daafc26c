//! Progress accounting for the presentation surface.

use std::time::Instant;

use mosaic_core::models::PipelineStats;

/// Tracks throughput of the current session and derives ETA.
pub(crate) struct ProgressTracker {
    started: Instant,
    total: usize,
    /// Images already present when the session resumed.
    preloaded: usize,
    /// Images handled this session (embedded, failed, or skipped).
    session_processed: usize,
}

impl ProgressTracker {
    pub fn new(total: usize, preloaded: usize) -> Self {
        Self {
            started: Instant::now(),
            total,
            preloaded,
            session_processed: 0,
        }
    }

    pub fn record(&mut self, count: usize) {
        self.session_processed += count;
    }

    pub fn processed(&self) -> usize {
        self.preloaded + self.session_processed
    }

    pub fn snapshot(&self, current_action: &str, completed: bool) -> PipelineStats {
        let speed_sec_per_image = if self.session_processed > 0 {
            self.started.elapsed().as_secs_f64() / self.session_processed as f64
        } else {
            0.0
        };
        let remaining = self.total.saturating_sub(self.processed());
        let eta_millis = (speed_sec_per_image * remaining as f64 * 1000.0) as i64;

        PipelineStats {
            processed: self.processed(),
            total: self.total,
            speed_sec_per_image,
            eta_millis,
            current_action: current_action.to_string(),
            completed,
        }
    }
}
