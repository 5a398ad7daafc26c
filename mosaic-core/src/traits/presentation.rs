use crate::models::{ClusterSet, PipelineStats};

/// The presentation surface. The coordinator is the only caller, so
/// updates arrive serialized.
pub trait PresentationSink: Send + Sync {
    fn render(&self, clusters: &ClusterSet);

    fn notify_stats(&self, stats: &PipelineStats);
}
