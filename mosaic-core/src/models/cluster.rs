use serde::{Deserialize, Serialize};

use super::record::EmbeddingRecord;

/// One member chosen to summarize a cluster for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representative {
    pub record: EmbeddingRecord,
    /// True when this slot of a frozen cluster was backfilled from
    /// outside the previously preferred set.
    pub is_replacement: bool,
}

impl Representative {
    pub fn new(record: EmbeddingRecord) -> Self {
        Self {
            record,
            is_replacement: false,
        }
    }

    pub fn replacement(record: EmbeddingRecord) -> Self {
        Self {
            record,
            is_replacement: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.record.path
    }
}

/// One cluster of a pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Pass-local label, 1-based, assigned after size ordering.
    pub id: usize,
    pub centroid: Vec<f32>,
    pub members: Vec<EmbeddingRecord>,
    pub representatives: Vec<Representative>,
    pub is_frozen: bool,
    /// Cumulative count of original representatives a frozen group has
    /// lost to membership drift.
    pub drift_count: usize,
    /// Previous pass index of this group when a frozen identity moved.
    pub moved_from: Option<usize>,
}

impl Cluster {
    /// Paths of the current representatives.
    pub fn representative_paths(&self) -> Vec<String> {
        self.representatives
            .iter()
            .map(|r| r.record.path.clone())
            .collect()
    }

    pub fn contains_member(&self, path: &str) -> bool {
        self.members.iter().any(|m| m.path == path)
    }
}

/// Result of one clustering pass: size-ordered clusters plus the raw
/// (pre-sort) centroid table used to warm-start the next pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSet {
    pub clusters: Vec<Cluster>,
    pub centroids: Vec<Vec<f32>>,
}

impl ClusterSet {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Look up a cluster by its pass-local label.
    pub fn cluster(&self, id: usize) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    pub fn cluster_mut(&mut self, id: usize) -> Option<&mut Cluster> {
        self.clusters.iter_mut().find(|c| c.id == id)
    }
}
