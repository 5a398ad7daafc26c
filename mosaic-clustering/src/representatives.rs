//! Representative selection: centroid proximity with a greedy pairwise
//! diversity walk.
//!
//! Strict proximity alone yields visually redundant previews for dense
//! clusters; the dedup threshold trades proximity for diversity.

use mosaic_core::models::EmbeddingRecord;

use crate::distance::cosine_distance;

/// Members sorted by ascending cosine distance to the centroid.
/// Distance ties resolve by path so the ranking is deterministic.
pub fn rank_by_proximity(members: &[EmbeddingRecord], centroid: &[f32]) -> Vec<EmbeddingRecord> {
    let mut ranked: Vec<(f64, &EmbeddingRecord)> = members
        .iter()
        .map(|m| (cosine_distance(&m.vector, centroid), m))
        .collect();
    ranked.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.path.cmp(&b.1.path))
    });
    ranked.into_iter().map(|(_, m)| m.clone()).collect()
}

/// Walk the proximity ranking and accept a candidate only if it sits at
/// least `threshold` away from every already-accepted representative.
/// Stops at `cap` accepted or the end of the list.
pub fn select_representatives(
    members: &[EmbeddingRecord],
    centroid: &[f32],
    threshold: f64,
    cap: usize,
) -> Vec<EmbeddingRecord> {
    let ranked = rank_by_proximity(members, centroid);
    let mut accepted: Vec<EmbeddingRecord> = Vec::with_capacity(cap.min(ranked.len()));

    for candidate in ranked {
        if accepted.len() >= cap {
            break;
        }
        let diverse = accepted
            .iter()
            .all(|a| cosine_distance(&a.vector, &candidate.vector) >= threshold);
        if diverse {
            accepted.push(candidate);
        }
    }

    accepted
}
