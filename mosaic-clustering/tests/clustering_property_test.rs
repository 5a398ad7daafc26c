//! Property tests over the pass-level invariants.

use std::collections::HashSet;

use proptest::prelude::*;

use mosaic_clustering::{cosine_distance, ClusterEngine, ClusterParams};
use mosaic_core::models::EmbeddingRecord;

prop_compose! {
    fn arb_records()(dims in 2usize..8)(
        vectors in prop::collection::vec(
            prop::collection::vec(-10.0f32..10.0, dims),
            1..60,
        ),
    ) -> Vec<EmbeddingRecord> {
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| EmbeddingRecord::new(format!("img/{i}"), v))
            .collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_members_partition_records(
        records in arb_records(),
        k in 2usize..8,
        seed in 0u64..1000,
    ) {
        let mut engine = ClusterEngine::with_seed(seed);
        let params = ClusterParams {
            k,
            threshold: 0.15,
            iteration_cap: 20,
            representatives_per_cluster: 16,
        };
        let set = engine.update_clusters(&records, &params, None);

        prop_assert_eq!(set.clusters.len(), k.min(records.len()));

        let mut seen = HashSet::new();
        for cluster in &set.clusters {
            for member in &cluster.members {
                prop_assert!(seen.insert(member.path.clone()));
            }
        }
        prop_assert_eq!(seen.len(), records.len());
    }

    #[test]
    fn prop_labels_are_one_based_and_ordered_by_size(
        records in arb_records(),
        seed in 0u64..1000,
    ) {
        let mut engine = ClusterEngine::with_seed(seed);
        let params = ClusterParams {
            k: 4,
            threshold: 0.15,
            iteration_cap: 20,
            representatives_per_cluster: 16,
        };
        let set = engine.update_clusters(&records, &params, None);

        for (position, cluster) in set.clusters.iter().enumerate() {
            prop_assert_eq!(cluster.id, position + 1);
        }
        for pair in set.clusters.windows(2) {
            prop_assert!(pair[0].members.len() >= pair[1].members.len());
        }
    }

    #[test]
    fn prop_representatives_are_diverse_members(
        records in arb_records(),
        threshold in 0.0f64..0.5,
        seed in 0u64..1000,
    ) {
        let mut engine = ClusterEngine::with_seed(seed);
        let params = ClusterParams {
            k: 3,
            threshold,
            iteration_cap: 20,
            representatives_per_cluster: 16,
        };
        let set = engine.update_clusters(&records, &params, None);

        for cluster in &set.clusters {
            let members: HashSet<&str> =
                cluster.members.iter().map(|m| m.path.as_str()).collect();
            for rep in &cluster.representatives {
                prop_assert!(members.contains(rep.path()));
            }
            for (i, a) in cluster.representatives.iter().enumerate() {
                for b in cluster.representatives.iter().skip(i + 1) {
                    prop_assert!(
                        cosine_distance(&a.record.vector, &b.record.vector) >= threshold
                    );
                }
            }
        }
    }
}
