//! Centroid initialization: K-Means++ seeding for cold starts.

use rand::rngs::StdRng;
use rand::Rng;

use mosaic_core::models::EmbeddingRecord;

use crate::distance::cosine_distance;

/// K-Means++ seeding: the first centroid is uniform over the records;
/// each subsequent centroid is drawn proportionally to the squared
/// minimum cosine distance from the already-chosen set.
///
/// Callers guarantee `1 <= k <= records.len()`.
pub(crate) fn seed_centroids(
    rng: &mut StdRng,
    records: &[EmbeddingRecord],
    k: usize,
) -> Vec<Vec<f32>> {
    let first = rng.gen_range(0..records.len());
    let mut centroids = vec![records[first].vector.clone()];

    let mut min_dist_sq: Vec<f64> = records
        .iter()
        .map(|r| cosine_distance(&r.vector, &centroids[0]).powi(2))
        .collect();

    while centroids.len() < k {
        let total: f64 = min_dist_sq.iter().sum();
        // Underflow fallback: when every record coincides with a chosen
        // centroid, the cumulative walk below would never trigger.
        let mut chosen = records.len() - 1;
        if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            for (index, weight) in min_dist_sq.iter().enumerate() {
                cumulative += weight;
                if cumulative >= target {
                    chosen = index;
                    break;
                }
            }
        }

        let centroid = records[chosen].vector.clone();
        for (slot, record) in min_dist_sq.iter_mut().zip(records.iter()) {
            let d = cosine_distance(&record.vector, &centroid).powi(2);
            if d < *slot {
                *slot = d;
            }
        }
        centroids.push(centroid);
    }

    centroids
}
