//! The orchestrating actor. Owns the store and the freeze manager,
//! serializes every update to the presentation surface, and coalesces
//! re-cluster requests so at most one extra pass ever queues up.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use mosaic_clustering::ClusterParams;
use mosaic_core::config::MosaicConfig;
use mosaic_core::errors::{FreezeError, MosaicResult};
use mosaic_core::models::ClusterSet;
use mosaic_core::traits::PresentationSink;
use mosaic_freeze::FreezeManager;
use mosaic_storage::ImageStore;

use crate::messages::{ClusterRequest, Command};

pub(crate) struct Coordinator {
    store: ImageStore,
    freeze: FreezeManager,
    config: MosaicConfig,
    sink: Arc<dyn PresentationSink>,
    cluster_tx: mpsc::Sender<ClusterRequest>,
    /// The last pass as published (freeze constraints applied).
    latest: Option<ClusterSet>,
    /// Raw centroids of the last pass, for the next warm start.
    warm_centroids: Option<Vec<Vec<f32>>>,
    is_clustering: bool,
    pending_recluster: bool,
    total_images: usize,
}

impl Coordinator {
    pub fn new(
        store: ImageStore,
        config: MosaicConfig,
        sink: Arc<dyn PresentationSink>,
        cluster_tx: mpsc::Sender<ClusterRequest>,
        total_images: usize,
    ) -> Self {
        Self {
            store,
            freeze: FreezeManager::new(),
            config,
            sink,
            cluster_tx,
            latest: None,
            warm_centroids: None,
            is_clustering: false,
            pending_recluster: false,
            total_images,
        }
    }

    /// Event loop: commands on one side, pass completions on the other.
    /// Exits when every command sender is gone.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut in_flight: Option<oneshot::Receiver<ClusterSet>> = None;
        loop {
            tokio::select! {
                maybe_command = commands.recv() => match maybe_command {
                    Some(command) => self.handle(command, &mut in_flight).await,
                    None => break,
                },
                pass = async { in_flight.as_mut().expect("branch gated on is_some").await },
                    if in_flight.is_some() =>
                {
                    in_flight = None;
                    self.is_clustering = false;
                    match pass {
                        Ok(set) => self.finish_pass(set, &mut in_flight).await,
                        Err(_) => warn!("clustering worker dropped a pass"),
                    }
                }
            }
        }

        // Every command sender is gone; publish the in-flight pass and
        // its coalesced follow-up before exiting.
        while let Some(rx) = in_flight.take() {
            self.is_clustering = false;
            match rx.await {
                Ok(set) => self.finish_pass(set, &mut in_flight).await,
                Err(_) => warn!("clustering worker dropped a pass"),
            }
        }
        debug!("coordinator stopped");
    }

    async fn handle(
        &mut self,
        command: Command,
        in_flight: &mut Option<oneshot::Receiver<ClusterSet>>,
    ) {
        match command {
            Command::NewData { records, reply } => {
                let outcome = self.store.put_many(records);
                if outcome.is_ok() {
                    // A failed persist is recoverable: the next flush
                    // rewrites the full snapshot.
                    if let Err(e) = self.store.persist(self.total_images) {
                        warn!(error = %e, "persist failed, will retry at next flush");
                    }
                    self.request_recluster(in_flight).await;
                }
                let _ = reply.send(outcome);
            }
            Command::Progress { stats } => {
                self.sink.notify_stats(&stats);
            }
            Command::Exclude { path, reply } => {
                let _ = reply.send(self.exclude(&path, in_flight).await);
            }
            Command::Restore { path, reply } => {
                if self.store.restore(&path) {
                    if let Err(e) = self.store.persist(self.total_images) {
                        warn!(error = %e, "persist failed after restore");
                    }
                    self.request_recluster(in_flight).await;
                }
                let _ = reply.send(Ok(()));
            }
            Command::Freeze { index, reply } => {
                let _ = reply.send(self.freeze_cluster(index));
            }
            Command::Unfreeze { index, reply } => {
                let _ = reply.send(self.unfreeze_cluster(index));
            }
            Command::SetClustering { k, threshold, reply } => {
                let _ = reply.send(self.set_clustering(k, threshold, in_flight).await);
            }
            Command::RequestRecluster => {
                self.request_recluster(in_flight).await;
            }
            Command::Clusters { reply } => {
                let _ = reply.send(self.latest.clone());
            }
        }
    }

    /// Exclusions of a frozen group's current representative are
    /// rejected; anything else takes effect at the next pass.
    async fn exclude(
        &mut self,
        path: &str,
        in_flight: &mut Option<oneshot::Receiver<ClusterSet>>,
    ) -> MosaicResult<()> {
        if let Some(cluster_index) = self.freeze.frozen_representative_of(path) {
            return Err(FreezeError::FrozenRepresentative {
                path: path.to_string(),
                cluster_index,
            }
            .into());
        }
        if self.store.exclude(path) {
            if let Err(e) = self.store.persist(self.total_images) {
                warn!(error = %e, "persist failed after exclusion");
            }
            self.request_recluster(in_flight).await;
        }
        Ok(())
    }

    fn freeze_cluster(&mut self, index: usize) -> MosaicResult<()> {
        let Some(latest) = self.latest.as_mut() else {
            return Err(FreezeError::UnknownCluster { index }.into());
        };
        self.freeze.freeze(
            latest,
            index,
            self.config.clustering.representatives_per_cluster,
        )?;
        self.sink.render(latest);
        Ok(())
    }

    fn unfreeze_cluster(&mut self, index: usize) -> MosaicResult<()> {
        let Some(latest) = self.latest.as_mut() else {
            return Err(FreezeError::NotFrozen { index }.into());
        };
        self.freeze.unfreeze(
            latest,
            index,
            self.config.clustering.threshold,
            self.config.clustering.representatives_per_cluster,
        )?;
        self.sink.render(latest);
        Ok(())
    }

    /// Apply new clustering settings. A changed K invalidates the warm
    /// start; either change schedules an immediate pass.
    async fn set_clustering(
        &mut self,
        k: Option<usize>,
        threshold: Option<f64>,
        in_flight: &mut Option<oneshot::Receiver<ClusterSet>>,
    ) -> MosaicResult<()> {
        let mut candidate = self.config.clustering.clone();
        if let Some(k) = k {
            candidate.k = k;
        }
        if let Some(threshold) = threshold {
            candidate.threshold = threshold;
        }
        candidate.validate()?;

        if candidate.k != self.config.clustering.k {
            info!(
                old_k = self.config.clustering.k,
                new_k = candidate.k,
                "cluster count changed, warm start invalidated"
            );
            self.warm_centroids = None;
        }
        self.config.clustering = candidate;
        self.request_recluster(in_flight).await;
        Ok(())
    }

    /// The single re-cluster entry point. While a pass is in flight,
    /// any number of requests collapse into one follow-up.
    async fn request_recluster(
        &mut self,
        in_flight: &mut Option<oneshot::Receiver<ClusterSet>>,
    ) {
        if self.is_clustering {
            self.pending_recluster = true;
            return;
        }

        let records = self.store.valid();
        let (reply, rx) = oneshot::channel();
        let request = ClusterRequest {
            records,
            params: ClusterParams::from(&self.config.clustering),
            previous_centroids: self.warm_centroids.clone(),
            reply,
        };
        if self.cluster_tx.send(request).await.is_err() {
            warn!("clustering worker unavailable");
            return;
        }
        self.is_clustering = true;
        *in_flight = Some(rx);
    }

    /// Pass completion: keep the raw centroids, apply the freeze
    /// constraints, publish, then run the coalesced follow-up if one
    /// queued up.
    async fn finish_pass(
        &mut self,
        set: ClusterSet,
        in_flight: &mut Option<oneshot::Receiver<ClusterSet>>,
    ) {
        self.warm_centroids = Some(set.centroids.clone());
        let applied = self.freeze.apply(
            set,
            self.config.clustering.threshold,
            self.config.clustering.representatives_per_cluster,
        );
        debug!(
            clusters = applied.clusters.len(),
            frozen = self.freeze.len(),
            "pass published"
        );
        self.sink.render(&applied);
        self.latest = Some(applied);

        if self.pending_recluster {
            self.pending_recluster = false;
            self.request_recluster(in_flight).await;
        }
    }
}
