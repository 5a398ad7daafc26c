//! The two worker contexts: embedding inference and clustering.
//!
//! Each worker is a dedicated OS thread that owns its engine
//! exclusively and drains a bounded channel of request envelopes. A
//! worker exits when every sender is dropped.

use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::debug;

use mosaic_clustering::ClusterEngine;
use mosaic_core::traits::VisionEmbedder;

use crate::messages::{ClusterRequest, EmbedRequest};

/// Spawn the inference worker. The embedder is owned by this thread;
/// calls are inherently serialized.
pub(crate) fn spawn_inference_worker(
    embedder: Box<dyn VisionEmbedder>,
    mut rx: mpsc::Receiver<EmbedRequest>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        debug!(provider = embedder.name(), "inference worker started");
        while let Some(request) = rx.blocking_recv() {
            let result = embedder.embed_batch(&request.images);
            // A dropped reply means the producer aborted; keep draining.
            let _ = request.reply.send(result);
        }
        debug!("inference worker stopped");
    })
}

/// Spawn the clustering worker. A pass always runs to completion;
/// freshness is recovered by the coordinator's coalescing follow-up.
pub(crate) fn spawn_clustering_worker(
    mut engine: ClusterEngine,
    mut rx: mpsc::Receiver<ClusterRequest>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        debug!("clustering worker started");
        while let Some(request) = rx.blocking_recv() {
            let set = engine.update_clusters(
                &request.records,
                &request.params,
                request.previous_centroids.as_deref(),
            );
            let _ = request.reply.send(set);
        }
        debug!("clustering worker stopped");
    })
}
