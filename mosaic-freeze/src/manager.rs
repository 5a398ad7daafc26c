//! The freeze map and its lifecycle operations.

use std::collections::BTreeMap;

use tracing::{debug, info};
use uuid::Uuid;

use mosaic_clustering::select_representatives;
use mosaic_core::constants::FREEZE_MATCH_FLOOR;
use mosaic_core::errors::FreezeError;
use mosaic_core::models::{ClusterSet, Representative};

use crate::{enforcement, matching};

/// State held for one frozen group, keyed by the group's *current*
/// cluster index.
#[derive(Debug, Clone)]
pub struct FrozenEntry {
    /// Stable identity across passes; the map key moves, this doesn't.
    pub identity: Uuid,
    /// Index at freeze time, kept for logging.
    pub initial_index: usize,
    /// The paths frozen originally. Immutable for the entry's lifetime.
    pub original_paths: std::collections::BTreeSet<String>,
    /// Paths currently displayed as this group's representatives.
    pub preferred_paths: std::collections::BTreeSet<String>,
}

/// Maps current cluster indices to frozen entries and reconciles them
/// against each new pass.
#[derive(Default)]
pub struct FreezeManager {
    entries: BTreeMap<usize, FrozenEntry>,
}

impl FreezeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn frozen_indices(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    pub fn entry(&self, index: usize) -> Option<&FrozenEntry> {
        self.entries.get(&index)
    }

    /// The cluster index whose frozen group currently displays `path`,
    /// if any. Exclusion of such a path must be rejected.
    pub fn frozen_representative_of(&self, path: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.preferred_paths.contains(path))
            .map(|(&index, _)| index)
    }

    /// Pin the cluster at `index`. The cluster must currently display a
    /// full set of `required` representatives.
    pub fn freeze(
        &mut self,
        set: &mut ClusterSet,
        index: usize,
        required: usize,
    ) -> Result<(), FreezeError> {
        if self.entries.contains_key(&index) {
            return Err(FreezeError::AlreadyFrozen { index });
        }
        let cluster = set
            .cluster_mut(index)
            .ok_or(FreezeError::UnknownCluster { index })?;
        if cluster.representatives.len() != required {
            return Err(FreezeError::InsufficientMembers {
                index,
                representatives: cluster.representatives.len(),
                required,
            });
        }

        let paths: std::collections::BTreeSet<String> = cluster
            .representatives
            .iter()
            .map(|r| r.path().to_string())
            .collect();

        cluster.is_frozen = true;
        let entry = FrozenEntry {
            identity: Uuid::new_v4(),
            initial_index: index,
            original_paths: paths.clone(),
            preferred_paths: paths,
        };
        info!(identity = %entry.identity, index, "cluster frozen");
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Drop the pin at `index` and recompute that cluster's
    /// representatives from its current members, without re-running
    /// K-Means.
    pub fn unfreeze(
        &mut self,
        set: &mut ClusterSet,
        index: usize,
        threshold: f64,
        cap: usize,
    ) -> Result<(), FreezeError> {
        let entry = self
            .entries
            .remove(&index)
            .ok_or(FreezeError::NotFrozen { index })?;
        info!(identity = %entry.identity, index, "cluster unfrozen");

        if let Some(cluster) = set.cluster_mut(index) {
            cluster.is_frozen = false;
            cluster.drift_count = 0;
            cluster.moved_from = None;
            cluster.representatives =
                select_representatives(&cluster.members, &cluster.centroid, threshold, cap)
                    .into_iter()
                    .map(Representative::new)
                    .collect();
        }
        Ok(())
    }

    /// Reconcile every frozen entry against a fresh pass. Groups that
    /// find no sufficiently overlapping cluster, or land on one with
    /// too few members, are auto-unfrozen. Surviving entries are
    /// rekeyed to their new indices.
    pub fn apply(&mut self, mut set: ClusterSet, threshold: f64, cap: usize) -> ClusterSet {
        if self.entries.is_empty() {
            return set;
        }

        let candidates = matching::enumerate(&self.entries, &set, FREEZE_MATCH_FLOOR);
        let accepted = matching::assign_greedy(candidates);

        let mut surviving = BTreeMap::new();
        for assignment in accepted {
            let Some(mut entry) = self.entries.remove(&assignment.old_index) else {
                continue;
            };
            let Some(cluster) = set.cluster_mut(assignment.new_index) else {
                continue;
            };
            if cluster.members.len() < cap {
                info!(
                    identity = %entry.identity,
                    index = assignment.new_index,
                    members = cluster.members.len(),
                    "frozen group auto-unfrozen: too few members"
                );
                continue;
            }

            let enforced = enforcement::enforce(
                cluster,
                &entry,
                assignment.old_index,
                threshold,
                cap,
            );
            debug!(
                identity = %entry.identity,
                from = assignment.old_index,
                to = assignment.new_index,
                matched = assignment.matched,
                drift = enforced.drift_count,
                "frozen group carried to new pass"
            );
            entry.preferred_paths = enforced.preferred_paths;
            surviving.insert(assignment.new_index, entry);
        }

        for (index, entry) in std::mem::take(&mut self.entries) {
            info!(
                identity = %entry.identity,
                index,
                "frozen group auto-unfrozen: no matching cluster"
            );
        }
        self.entries = surviving;
        set
    }
}
