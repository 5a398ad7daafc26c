//! The embedding producer: picks random batches of unprocessed images,
//! runs them through the inference worker, and flushes finished
//! records to the coordinator.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};

use mosaic_core::constants::PRODUCER_YIELD_MS;
use mosaic_core::models::EmbeddingRecord;
use mosaic_core::traits::ImageHandle;

use crate::messages::{Command, EmbedRequest};
use crate::stats::ProgressTracker;

/// Level-triggered producer control. `Aborted` is terminal: the
/// producer drains its buffer and stops picking new batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerControl {
    Running,
    Paused,
    Aborted,
}

pub(crate) struct Producer {
    /// Unprocessed image handles; emptied as batches are drawn.
    pub pool: Vec<Box<dyn ImageHandle>>,
    pub batch_size: usize,
    /// Flush cadence; mid-run changes apply to the next flush check.
    pub refresh_rx: watch::Receiver<usize>,
    pub control_rx: watch::Receiver<ProducerControl>,
    pub embed_tx: mpsc::Sender<EmbedRequest>,
    pub command_tx: mpsc::Sender<Command>,
    pub tracker: ProgressTracker,
}

impl Producer {
    pub async fn run(mut self) {
        let mut rng = StdRng::from_entropy();
        let mut buffer: Vec<EmbeddingRecord> = Vec::new();
        let mut aborted = false;

        info!(pool = self.pool.len(), "producer started");

        while !self.pool.is_empty() {
            match self.wait_ready().await {
                ProducerControl::Running => {}
                ProducerControl::Aborted => {
                    aborted = true;
                    break;
                }
                ProducerControl::Paused => unreachable!("wait_ready never yields Paused"),
            }

            // Uniform random draw without replacement.
            let draw = self.batch_size.min(self.pool.len());
            let mut batch: Vec<Box<dyn ImageHandle>> = Vec::with_capacity(draw);
            for _ in 0..draw {
                let index = rng.gen_range(0..self.pool.len());
                batch.push(self.pool.swap_remove(index));
            }

            let mut images = Vec::with_capacity(batch.len());
            let mut paths = Vec::with_capacity(batch.len());
            for handle in &batch {
                match handle.open() {
                    Ok(pixels) => {
                        images.push(pixels);
                        paths.push(handle.path().to_string());
                    }
                    Err(e) => {
                        warn!(path = handle.path(), error = %e, "decode failed, skipping");
                    }
                }
            }

            if !images.is_empty() {
                let (reply, reply_rx) = oneshot::channel();
                if self
                    .embed_tx
                    .send(EmbedRequest { images, reply })
                    .await
                    .is_err()
                {
                    error!("inference worker unavailable, stopping producer");
                    break;
                }
                match reply_rx.await {
                    Ok(Ok(vectors)) if vectors.len() == paths.len() => {
                        buffer.extend(
                            paths
                                .into_iter()
                                .zip(vectors)
                                .map(|(path, vector)| EmbeddingRecord::new(path, vector)),
                        );
                    }
                    Ok(Ok(vectors)) => {
                        warn!(
                            images = paths.len(),
                            vectors = vectors.len(),
                            "embedder broke positional correspondence, batch dropped"
                        );
                    }
                    Ok(Err(e)) => {
                        // The batch's paths stay consumed so a poisoned
                        // input cannot retry forever.
                        warn!(error = %e, "embedding batch failed, paths marked processed");
                    }
                    Err(_) => {
                        error!("inference worker dropped a batch, stopping producer");
                        break;
                    }
                }
            }

            self.tracker.record(batch.len());
            self.notify_progress("embedding", false).await;

            let refresh_interval = *self.refresh_rx.borrow();
            if buffer.len() >= refresh_interval && !self.flush(&mut buffer).await {
                return;
            }

            // Brief yield between batches keeps the surface responsive.
            tokio::time::sleep(Duration::from_millis(PRODUCER_YIELD_MS)).await;
        }

        // Drain: whatever the in-flight batches produced is committed,
        // even on abort.
        if !buffer.is_empty() && !self.flush(&mut buffer).await {
            return;
        }

        self.notify_progress("idle", !aborted).await;
        info!(aborted, "producer finished");
    }

    /// Block while paused; resolve to `Running` or `Aborted`.
    async fn wait_ready(&mut self) -> ProducerControl {
        loop {
            let control = *self.control_rx.borrow();
            match control {
                ProducerControl::Running => return ProducerControl::Running,
                ProducerControl::Aborted => return ProducerControl::Aborted,
                ProducerControl::Paused => {
                    if self.control_rx.changed().await.is_err() {
                        return ProducerControl::Aborted;
                    }
                }
            }
        }
    }

    /// Hand the buffer to the coordinator: put_many, persist, and the
    /// re-cluster notification happen there, in that order. Returns
    /// false on a session-fatal store error.
    async fn flush(&mut self, buffer: &mut Vec<EmbeddingRecord>) -> bool {
        let records = std::mem::take(buffer);
        let count = records.len();
        let (reply, reply_rx) = oneshot::channel();
        if self
            .command_tx
            .send(Command::NewData { records, reply })
            .await
            .is_err()
        {
            error!("coordinator unavailable, stopping producer");
            return false;
        }
        match reply_rx.await {
            Ok(Ok(())) => {
                info!(count, "flush committed");
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, "flush rejected, stopping producer");
                false
            }
            Err(_) => {
                error!("coordinator dropped a flush, stopping producer");
                false
            }
        }
    }

    async fn notify_progress(&self, action: &str, completed: bool) {
        let stats = self.tracker.snapshot(action, completed);
        let _ = self.command_tx.send(Command::Progress { stats }).await;
    }
}
