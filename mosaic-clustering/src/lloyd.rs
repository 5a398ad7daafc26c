//! Lloyd's iteration: assign, update, reseed orphans.

use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;

use mosaic_core::models::EmbeddingRecord;

use crate::distance::cosine_distance;

/// Index of the nearest centroid by cosine distance. Ties resolve to
/// the lowest index.
pub(crate) fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let d = cosine_distance(vector, centroid);
        if d < best_dist {
            best_dist = d;
            best = index;
        }
    }
    best
}

/// Run Lloyd's iteration in place, returning the final assignment of
/// each record to a centroid index and the number of iterations used.
///
/// Stops when an assignment pass changes nothing or the cap is hit.
/// A centroid left without members is reseeded from a uniformly random
/// record so a warm start cannot silently collapse K.
pub(crate) fn run(
    rng: &mut StdRng,
    records: &[EmbeddingRecord],
    centroids: &mut [Vec<f32>],
    iteration_cap: usize,
) -> (Vec<usize>, usize) {
    let k = centroids.len();
    let dims = centroids.first().map(|c| c.len()).unwrap_or(0);

    let mut assignments = vec![usize::MAX; records.len()];
    // Sum/count buffers reused across iterations.
    let mut sums = vec![vec![0.0f64; dims]; k];
    let mut counts = vec![0usize; k];

    for iteration in 0..iteration_cap {
        let next: Vec<usize> = records
            .par_iter()
            .map(|r| nearest_centroid(&r.vector, centroids))
            .collect();

        if next == assignments {
            return (assignments, iteration);
        }
        assignments = next;

        for sum in &mut sums {
            sum.fill(0.0);
        }
        counts.fill(0);

        for (record, &assigned) in records.iter().zip(&assignments) {
            counts[assigned] += 1;
            for (slot, &value) in sums[assigned].iter_mut().zip(&record.vector) {
                *slot += value as f64;
            }
        }

        for (index, centroid) in centroids.iter_mut().enumerate() {
            if counts[index] == 0 {
                let reseed = rng.gen_range(0..records.len());
                centroid.copy_from_slice(&records[reseed].vector);
                continue;
            }
            let count = counts[index] as f64;
            for (slot, sum) in centroid.iter_mut().zip(&sums[index]) {
                *slot = (sum / count) as f32;
            }
        }
    }

    (assignments, iteration_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use test_fixtures::{record, region};

    #[test]
    fn nearest_prefers_lowest_index_on_tie() {
        let centroids = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        assert_eq!(nearest_centroid(&[1.0, 0.0], &centroids), 0);
    }

    #[test]
    fn converges_on_separated_regions() {
        let mut records = region("a", &[1.0, 0.0], 8, 0.02);
        records.extend(region("b", &[0.0, 1.0], 8, 0.02));

        let mut centroids = vec![vec![0.9, 0.1], vec![0.1, 0.9]];
        let mut rng = StdRng::seed_from_u64(1);
        let (assignments, iterations) = run(&mut rng, &records, &mut centroids, 20);

        assert!(iterations < 20, "separable data should converge early");
        let first = &assignments[..8];
        let second = &assignments[8..];
        assert!(first.iter().all(|&a| a == first[0]));
        assert!(second.iter().all(|&a| a == second[0]));
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn orphan_centroid_is_reseeded() {
        let records = vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![0.99, 0.01]),
        ];
        // Second centroid is far from every record and would orphan.
        let mut centroids = vec![vec![1.0, 0.0], vec![-1.0, 0.0]];
        let mut rng = StdRng::seed_from_u64(2);
        run(&mut rng, &records, &mut centroids, 20);

        assert!(
            records.iter().any(|r| {
                cosine_distance(&r.vector, &centroids[1]) < 0.5
            }),
            "orphaned centroid should have been reseeded near a record"
        );
    }

    #[test]
    fn centroid_becomes_member_mean() {
        let records = vec![
            record("a", vec![2.0, 0.0]),
            record("b", vec![4.0, 0.0]),
        ];
        let mut centroids = vec![vec![1.0, 0.0]];
        let mut rng = StdRng::seed_from_u64(3);
        run(&mut rng, &records, &mut centroids, 20);
        assert_eq!(centroids[0], vec![3.0, 0.0]);
    }
}
