//! Rebuilding a frozen cluster's representatives after a pass.

use std::collections::BTreeSet;

use mosaic_clustering::{cosine_distance, rank_by_proximity};
use mosaic_core::models::{Cluster, EmbeddingRecord, Representative};

use crate::manager::FrozenEntry;

/// Tiered origin of a candidate representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// Present in the group's immutable original sixteen.
    Original,
    /// Carried over from a previous pass's backfills.
    Filler,
    /// New to the group; shown flagged as a replacement.
    Other,
}

/// Outcome of enforcing one accepted assignment.
pub(crate) struct Enforced {
    /// Paths of the final representatives; becomes the entry's new
    /// preferred set.
    pub preferred_paths: BTreeSet<String>,
    pub drift_count: usize,
}

/// Rebuild `cluster`'s representatives from its new members, keeping
/// surviving originals first, then surviving fillers, then fresh
/// replacements. The diversity threshold applies across the combined
/// sequence; if it would leave the frozen group short, skipped
/// candidates are backfilled in rank order so the group always shows a
/// full set.
pub(crate) fn enforce(
    cluster: &mut Cluster,
    entry: &FrozenEntry,
    old_index: usize,
    threshold: f64,
    cap: usize,
) -> Enforced {
    let ranked = rank_by_proximity(&cluster.members, &cluster.centroid);

    let mut tiers: Vec<(EmbeddingRecord, Tier)> = Vec::with_capacity(ranked.len());
    for tier in [Tier::Original, Tier::Filler, Tier::Other] {
        for member in &ranked {
            let member_tier = if entry.original_paths.contains(&member.path) {
                Tier::Original
            } else if entry.preferred_paths.contains(&member.path) {
                Tier::Filler
            } else {
                Tier::Other
            };
            if member_tier == tier {
                tiers.push((member.clone(), tier));
            }
        }
    }

    let originals_present = tiers
        .iter()
        .filter(|(_, tier)| *tier == Tier::Original)
        .count();

    let mut accepted: Vec<(EmbeddingRecord, Tier)> = Vec::with_capacity(cap);
    let mut skipped: Vec<(EmbeddingRecord, Tier)> = Vec::new();
    for (record, tier) in tiers {
        if accepted.len() >= cap {
            break;
        }
        let diverse = accepted
            .iter()
            .all(|(a, _)| cosine_distance(&a.vector, &record.vector) >= threshold);
        if diverse {
            accepted.push((record, tier));
        } else {
            skipped.push((record, tier));
        }
    }

    // Backfill: a surviving frozen group always shows a full set.
    for (record, tier) in skipped {
        if accepted.len() >= cap {
            break;
        }
        accepted.push((record, tier));
    }

    let preferred_paths: BTreeSet<String> =
        accepted.iter().map(|(r, _)| r.path.clone()).collect();

    cluster.representatives = accepted
        .into_iter()
        .map(|(record, tier)| match tier {
            Tier::Other => Representative::replacement(record),
            _ => Representative::new(record),
        })
        .collect();
    cluster.is_frozen = true;
    cluster.drift_count = entry.original_paths.len().saturating_sub(originals_present);
    cluster.moved_from = (cluster.id != old_index).then_some(old_index);

    Enforced {
        preferred_paths,
        drift_count: cluster.drift_count,
    }
}
