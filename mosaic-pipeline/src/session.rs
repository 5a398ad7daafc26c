//! `MosaicSession` — the public facade that wires a project folder,
//! an embedder, persistence, and a presentation sink into a running
//! engine.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use mosaic_clustering::ClusterEngine;
use mosaic_core::config::MosaicConfig;
use mosaic_core::errors::{MosaicError, MosaicResult};
use mosaic_core::models::ClusterSet;
use mosaic_core::traits::{
    ImageScanner, PresentationSink, RecordPersistence, VisionEmbedder,
};
use mosaic_embeddings::EmbeddingEngine;
use mosaic_storage::ImageStore;

use crate::coordinator::Coordinator;
use crate::messages::Command;
use crate::producer::{Producer, ProducerControl};
use crate::stats::ProgressTracker;
use crate::workers;

/// A running Mosaic session.
///
/// Dropping the session (or calling [`MosaicSession::wait`]) tears the
/// pipeline down: the command channel closes, the coordinator exits,
/// and the worker threads drain.
pub struct MosaicSession {
    command_tx: mpsc::Sender<Command>,
    control_tx: watch::Sender<ProducerControl>,
    refresh_tx: watch::Sender<usize>,
    producer: Option<JoinHandle<()>>,
    coordinator: Option<JoinHandle<()>>,
}

impl MosaicSession {
    /// Start a session with the embedder named by the configuration,
    /// fronted by the content-hash cache.
    pub async fn start(
        config: MosaicConfig,
        scanner: Box<dyn ImageScanner>,
        persistence: Box<dyn RecordPersistence>,
        sink: Arc<dyn PresentationSink>,
    ) -> MosaicResult<Self> {
        let embedder = Box::new(EmbeddingEngine::new(&config.embedding));
        Self::start_with_embedder(config, scanner, embedder, persistence, sink).await
    }

    /// Start a session with an explicit embedder.
    pub async fn start_with_embedder(
        config: MosaicConfig,
        scanner: Box<dyn ImageScanner>,
        embedder: Box<dyn VisionEmbedder>,
        persistence: Box<dyn RecordPersistence>,
        sink: Arc<dyn PresentationSink>,
    ) -> MosaicResult<Self> {
        config.validate()?;

        let store = ImageStore::load(config.project.clone(), persistence)?;
        let processed = store.processed_paths();
        let preloaded = processed.len();

        let handles = scanner.scan()?;
        let total_images = handles.len().max(preloaded);
        let pool: Vec<_> = handles
            .into_iter()
            .filter(|h| !processed.contains(h.path()))
            .collect();

        info!(
            project = %config.project,
            found = total_images,
            preloaded,
            remaining = pool.len(),
            "session starting"
        );

        let (embed_tx, embed_rx) = mpsc::channel(2);
        let (cluster_tx, cluster_rx) = mpsc::channel(2);
        let (command_tx, command_rx) = mpsc::channel(64);
        let (control_tx, control_rx) = watch::channel(ProducerControl::Running);
        let (refresh_tx, refresh_rx) = watch::channel(config.producer.refresh_interval);

        // Worker threads exit on their own once the channels close.
        let _ = workers::spawn_inference_worker(embedder, embed_rx);
        let _ = workers::spawn_clustering_worker(ClusterEngine::new(), cluster_rx);

        let coordinator = Coordinator::new(
            store,
            config.clone(),
            sink,
            cluster_tx,
            total_images,
        );
        let coordinator_handle = tokio::spawn(coordinator.run(command_rx));

        // A resumed session shows its restored records right away.
        if preloaded > 0 {
            let _ = command_tx.send(Command::RequestRecluster).await;
        }

        let producer = Producer {
            pool,
            batch_size: config.producer.batch_size,
            refresh_rx,
            control_rx,
            embed_tx,
            command_tx: command_tx.clone(),
            tracker: ProgressTracker::new(total_images, preloaded),
        };
        let producer_handle = tokio::spawn(producer.run());

        Ok(Self {
            command_tx,
            control_tx,
            refresh_tx,
            producer: Some(producer_handle),
            coordinator: Some(coordinator_handle),
        })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> MosaicResult<T> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .await
            .map_err(|_| MosaicError::ChannelClosed {
                context: "coordinator commands".to_string(),
            })?;
        reply_rx.await.map_err(|_| MosaicError::ChannelClosed {
            context: "coordinator reply".to_string(),
        })
    }

    /// Exclude an image from clustering. Rejected while the path is a
    /// representative of a frozen cluster.
    pub async fn exclude(&self, path: &str) -> MosaicResult<()> {
        let path = path.to_string();
        self.request(|reply| Command::Exclude { path, reply }).await?
    }

    /// Undo an exclusion.
    pub async fn restore(&self, path: &str) -> MosaicResult<()> {
        let path = path.to_string();
        self.request(|reply| Command::Restore { path, reply }).await?
    }

    /// Pin the cluster currently displayed at `index`.
    pub async fn freeze(&self, index: usize) -> MosaicResult<()> {
        self.request(|reply| Command::Freeze { index, reply }).await?
    }

    /// Drop the pin at `index` and recompute its representatives.
    pub async fn unfreeze(&self, index: usize) -> MosaicResult<()> {
        self.request(|reply| Command::Unfreeze { index, reply }).await?
    }

    /// Change `k` and/or the dedup threshold; schedules an immediate
    /// re-cluster.
    pub async fn set_clustering(
        &self,
        k: Option<usize>,
        threshold: Option<f64>,
    ) -> MosaicResult<()> {
        self.request(|reply| Command::SetClustering { k, threshold, reply })
            .await?
    }

    /// Change the flush cadence; the next flush check uses the new
    /// value.
    pub fn set_refresh_interval(&self, records: usize) {
        let _ = self.refresh_tx.send(records);
    }

    /// Ask for a re-cluster pass (coalesced with any pass in flight).
    pub async fn request_recluster(&self) -> MosaicResult<()> {
        self.command_tx
            .send(Command::RequestRecluster)
            .await
            .map_err(|_| MosaicError::ChannelClosed {
                context: "coordinator commands".to_string(),
            })
    }

    /// Latest published pass, if any.
    pub async fn clusters(&self) -> MosaicResult<Option<ClusterSet>> {
        self.request(|reply| Command::Clusters { reply }).await
    }

    /// Pause the producer at the next batch boundary.
    pub fn pause(&self) {
        self.control_tx.send_if_modified(|state| {
            if *state == ProducerControl::Running {
                *state = ProducerControl::Paused;
                true
            } else {
                false
            }
        });
    }

    /// Resume a paused producer. A no-op after abort.
    pub fn resume(&self) {
        self.control_tx.send_if_modified(|state| {
            if *state == ProducerControl::Paused {
                *state = ProducerControl::Running;
                true
            } else {
                false
            }
        });
    }

    /// Stop producing. Terminal: the in-flight batch finishes and its
    /// records are committed, then the producer drains.
    pub fn abort(&self) {
        let _ = self.control_tx.send(ProducerControl::Aborted);
    }

    /// Wait for the producer to drain, then shut the pipeline down.
    pub async fn wait(mut self) {
        if let Some(producer) = self.producer.take() {
            let _ = producer.await;
        }
        // Dropping the command sender lets the coordinator exit.
        let coordinator = self.coordinator.take();
        drop(self);
        if let Some(coordinator) = coordinator {
            let _ = coordinator.await;
        }
    }
}
