//! Request/response envelopes passed between the orchestrating context
//! and the worker threads. Workers receive owned inputs and answer
//! over oneshot channels; nothing mutable is shared.

use tokio::sync::oneshot;

use mosaic_clustering::ClusterParams;
use mosaic_core::errors::MosaicResult;
use mosaic_core::models::{ClusterSet, EmbeddingRecord, ImagePixels, PipelineStats};

/// One embedding batch for the inference worker.
pub(crate) struct EmbedRequest {
    pub images: Vec<ImagePixels>,
    pub reply: oneshot::Sender<MosaicResult<Vec<Vec<f32>>>>,
}

/// One full pass for the clustering worker.
pub(crate) struct ClusterRequest {
    pub records: Vec<EmbeddingRecord>,
    pub params: ClusterParams,
    pub previous_centroids: Option<Vec<Vec<f32>>>,
    pub reply: oneshot::Sender<ClusterSet>,
}

/// Commands handled by the coordinator. This channel is the single
/// entry point for producer flushes, user operations, and settings
/// changes.
pub(crate) enum Command {
    /// Producer flush: commit records, persist, schedule a pass.
    NewData {
        records: Vec<EmbeddingRecord>,
        reply: oneshot::Sender<MosaicResult<()>>,
    },
    /// Producer progress, forwarded to the presentation sink.
    Progress { stats: PipelineStats },
    Exclude {
        path: String,
        reply: oneshot::Sender<MosaicResult<()>>,
    },
    Restore {
        path: String,
        reply: oneshot::Sender<MosaicResult<()>>,
    },
    Freeze {
        index: usize,
        reply: oneshot::Sender<MosaicResult<()>>,
    },
    Unfreeze {
        index: usize,
        reply: oneshot::Sender<MosaicResult<()>>,
    },
    /// Change clustering settings mid-run; schedules a pass.
    SetClustering {
        k: Option<usize>,
        threshold: Option<f64>,
        reply: oneshot::Sender<MosaicResult<()>>,
    },
    RequestRecluster,
    /// Snapshot of the latest published pass.
    Clusters {
        reply: oneshot::Sender<Option<ClusterSet>>,
    },
}
