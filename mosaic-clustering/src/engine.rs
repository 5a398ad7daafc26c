//! The clustering engine: one `update_clusters` pass per call.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use mosaic_core::config::ClusteringConfig;
use mosaic_core::models::{Cluster, ClusterSet, EmbeddingRecord, Representative};

use crate::{init, lloyd, representatives};

/// Per-pass tuning knobs, derived from `ClusteringConfig`.
#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub k: usize,
    pub threshold: f64,
    pub iteration_cap: usize,
    pub representatives_per_cluster: usize,
}

impl From<&ClusteringConfig> for ClusterParams {
    fn from(config: &ClusteringConfig) -> Self {
        Self {
            k: config.k,
            threshold: config.threshold,
            iteration_cap: config.iteration_cap,
            representatives_per_cluster: config.representatives_per_cluster,
        }
    }
}

/// Owns the RNG used for K-Means++ seeding and orphan reseeding. One
/// engine instance lives on the clustering worker for the whole
/// session.
pub struct ClusterEngine {
    rng: StdRng,
}

impl ClusterEngine {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic engine for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Run one full pass over the given records.
    ///
    /// Warm-starts from `previous_centroids` when the count matches the
    /// effective K; otherwise falls back to K-Means++ seeding. Never
    /// fails on valid numeric input: an empty record set yields an
    /// empty result and K clamps to the record count.
    pub fn update_clusters(
        &mut self,
        records: &[EmbeddingRecord],
        params: &ClusterParams,
        previous_centroids: Option<&[Vec<f32>]>,
    ) -> ClusterSet {
        if records.is_empty() {
            return ClusterSet::default();
        }

        let k = params.k.min(records.len());
        let warm = previous_centroids
            .filter(|prev| prev.len() == k)
            .map(|prev| prev.to_vec());
        let warm_started = warm.is_some();

        let mut centroids =
            warm.unwrap_or_else(|| init::seed_centroids(&mut self.rng, records, k));

        let (assignments, iterations) =
            lloyd::run(&mut self.rng, records, &mut centroids, params.iteration_cap);

        debug!(
            records = records.len(),
            k,
            warm_started,
            iterations,
            "clustering pass complete"
        );

        self.assemble(records, &assignments, centroids, params)
    }

    /// Group members per centroid, pick representatives, then order by
    /// descending size and relabel 1..K. The returned set carries the
    /// raw (pre-sort) centroid table for the next warm start.
    fn assemble(
        &mut self,
        records: &[EmbeddingRecord],
        assignments: &[usize],
        centroids: Vec<Vec<f32>>,
        params: &ClusterParams,
    ) -> ClusterSet {
        let k = centroids.len();
        let mut member_lists: Vec<Vec<EmbeddingRecord>> = vec![Vec::new(); k];
        for (record, &assigned) in records.iter().zip(assignments) {
            member_lists[assigned].push(record.clone());
        }

        let mut order: Vec<usize> = (0..k).collect();
        // Size ties keep the raw centroid order for determinism.
        order.sort_by_key(|&i| (std::cmp::Reverse(member_lists[i].len()), i));

        let clusters = order
            .iter()
            .enumerate()
            .map(|(position, &raw_index)| {
                let members = std::mem::take(&mut member_lists[raw_index]);
                let reps = representatives::select_representatives(
                    &members,
                    &centroids[raw_index],
                    params.threshold,
                    params.representatives_per_cluster,
                );
                Cluster {
                    id: position + 1,
                    centroid: centroids[raw_index].clone(),
                    members,
                    representatives: reps.into_iter().map(Representative::new).collect(),
                    is_frozen: false,
                    drift_count: 0,
                    moved_from: None,
                }
            })
            .collect();

        ClusterSet {
            clusters,
            centroids,
        }
    }
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::new()
    }
}
