//! Freeze lifecycle across re-cluster passes: survival, drift,
//! auto-unfreeze, and the bookkeeping invariants.

use std::collections::BTreeSet;

use mosaic_clustering::select_representatives;
use mosaic_core::errors::FreezeError;
use mosaic_core::models::{Cluster, ClusterSet, EmbeddingRecord, Representative};
use mosaic_freeze::FreezeManager;
use test_fixtures::record;

const CAP: usize = 16;

/// A cluster whose members sit near `center`, ranked by listed order.
/// Representatives are precomputed the way a fresh pass would.
fn make_cluster(id: usize, center: [f32; 2], paths: &[String]) -> Cluster {
    // The off-axis nudge grows with the index, so proximity ranking
    // follows the listed order.
    let members: Vec<EmbeddingRecord> = paths
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let offset = 0.001 * i as f32;
            let vector = if center[0] >= center[1] {
                vec![1.0, offset]
            } else {
                vec![offset, 1.0]
            };
            record(p, vector)
        })
        .collect();

    let centroid = vec![center[0], center[1]];
    let representatives = select_representatives(&members, &centroid, 0.0, CAP)
        .into_iter()
        .map(Representative::new)
        .collect();
    Cluster {
        id,
        centroid,
        members,
        representatives,
        is_frozen: false,
        drift_count: 0,
        moved_from: None,
    }
}

fn paths(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{prefix}{i}")).collect()
}

/// Pass one: cluster 1 is a 25-member "q" group, cluster 2 the
/// 20-member "p" group whose first 16 get frozen.
fn first_pass() -> ClusterSet {
    ClusterSet {
        clusters: vec![
            make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
            make_cluster(2, [1.0, 0.0], &paths("p", 0..20)),
        ],
        centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    }
}

fn freeze_p_group() -> (FreezeManager, ClusterSet) {
    let mut manager = FreezeManager::new();
    let mut set = first_pass();
    manager.freeze(&mut set, 2, CAP).unwrap();
    (manager, set)
}

#[test]
fn freeze_requires_full_representatives() {
    let mut manager = FreezeManager::new();
    let mut set = ClusterSet {
        clusters: vec![make_cluster(1, [1.0, 0.0], &paths("p", 0..9))],
        centroids: vec![vec![1.0, 0.0]],
    };
    let err = manager.freeze(&mut set, 1, CAP).unwrap_err();
    assert!(matches!(
        err,
        FreezeError::InsufficientMembers {
            index: 1,
            representatives: 9,
            required: 16,
        }
    ));
    assert!(!set.clusters[0].is_frozen);
}

#[test]
fn freeze_unknown_and_double_freeze_rejected() {
    let (mut manager, mut set) = freeze_p_group();
    assert!(matches!(
        manager.freeze(&mut set, 9, CAP),
        Err(FreezeError::UnknownCluster { index: 9 })
    ));
    assert!(matches!(
        manager.freeze(&mut set, 2, CAP),
        Err(FreezeError::AlreadyFrozen { index: 2 })
    ));
}

#[test]
fn freeze_records_the_displayed_sixteen() {
    let (manager, set) = freeze_p_group();
    let entry = manager.entry(2).unwrap();

    let expected: BTreeSet<String> = paths("p", 0..16).into_iter().collect();
    assert_eq!(entry.original_paths, expected);
    assert_eq!(entry.preferred_paths, expected);
    assert!(set.cluster(2).unwrap().is_frozen);
}

#[test]
fn frozen_group_survives_a_pass_and_moves_index() {
    let (mut manager, _) = freeze_p_group();

    // Next pass: the p group grew and became the largest (index 1).
    let mut p_paths = paths("p", 0..20);
    p_paths.push("p_new".to_string());
    p_paths.extend(paths("p_extra", 0..10));
    let second = ClusterSet {
        clusters: vec![
            make_cluster(1, [1.0, 0.0], &p_paths),
            make_cluster(2, [0.0, 1.0], &paths("q", 0..25)),
        ],
        centroids: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
    };

    let applied = manager.apply(second, 0.0, CAP);
    let carried = applied.cluster(1).unwrap();

    assert!(carried.is_frozen);
    assert_eq!(carried.moved_from, Some(2));
    assert_eq!(carried.representatives.len(), CAP);
    assert_eq!(carried.drift_count, 0, "all originals still present");

    // The originals lead the representative list.
    let first_sixteen: BTreeSet<String> = carried
        .representatives
        .iter()
        .map(|r| r.path().to_string())
        .collect();
    let originals: BTreeSet<String> = paths("p", 0..16).into_iter().collect();
    assert_eq!(first_sixteen, originals);

    // The entry map is rekeyed to the new index.
    assert_eq!(manager.frozen_indices(), vec![1]);
    let entry = manager.entry(1).unwrap();
    assert_eq!(entry.initial_index, 2);
}

#[test]
fn drift_replaces_lost_originals_and_counts_them() {
    let (mut manager, _) = freeze_p_group();

    // p12..p15 drifted away; the cluster gained fresh members.
    let mut remaining = paths("p", 0..12);
    remaining.extend(paths("x", 0..10));
    let second = ClusterSet {
        clusters: vec![
            make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
            make_cluster(2, [1.0, 0.0], &remaining),
        ],
        centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    };

    let applied = manager.apply(second, 0.0, CAP);
    let carried = applied.cluster(2).unwrap();

    assert!(carried.is_frozen);
    assert_eq!(carried.moved_from, None);
    assert_eq!(carried.drift_count, 4);
    assert_eq!(carried.representatives.len(), CAP);

    // Twelve surviving originals first, then four flagged replacements.
    let originals: BTreeSet<String> = paths("p", 0..12).into_iter().collect();
    for rep in &carried.representatives[..12] {
        assert!(originals.contains(rep.path()));
        assert!(!rep.is_replacement);
    }
    for rep in &carried.representatives[12..] {
        assert!(rep.path().starts_with('x'));
        assert!(rep.is_replacement);
    }

    // The preferred set now tracks the drifted identity; the originals
    // stay fixed.
    let entry = manager.entry(2).unwrap();
    assert_eq!(
        entry.original_paths,
        paths("p", 0..16).into_iter().collect::<BTreeSet<_>>()
    );
    assert!(entry.preferred_paths.iter().any(|p| p.starts_with('x')));
}

#[test]
fn auto_unfreeze_when_overlap_falls_below_floor() {
    let (mut manager, _) = freeze_p_group();

    // Only seven of the preferred sixteen remain anywhere.
    let mut remaining = paths("p", 0..7);
    remaining.extend(paths("y", 0..20));
    let second = ClusterSet {
        clusters: vec![
            make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
            make_cluster(2, [1.0, 0.0], &remaining),
        ],
        centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    };

    let applied = manager.apply(second, 0.0, CAP);
    assert!(manager.is_empty(), "entry must be dropped");
    assert!(applied.clusters.iter().all(|c| !c.is_frozen));
}

#[test]
fn auto_unfreeze_when_matched_cluster_is_too_small() {
    let (mut manager, _) = freeze_p_group();

    // Overlap is fine (10 >= 8) but the cluster shrank below sixteen.
    let second = ClusterSet {
        clusters: vec![
            make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
            make_cluster(2, [1.0, 0.0], &paths("p", 0..10)),
        ],
        centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    };

    let applied = manager.apply(second, 0.0, CAP);
    assert!(manager.is_empty());
    assert!(applied.clusters.iter().all(|c| !c.is_frozen));
}

#[test]
fn unfreeze_restores_plain_selection() {
    let (mut manager, mut set) = freeze_p_group();

    manager.unfreeze(&mut set, 2, 0.0, CAP).unwrap();
    assert!(manager.is_empty());

    let cluster = set.cluster(2).unwrap();
    assert!(!cluster.is_frozen);
    assert_eq!(cluster.drift_count, 0);
    assert_eq!(cluster.moved_from, None);

    let expected = select_representatives(&cluster.members, &cluster.centroid, 0.0, CAP);
    let actual: Vec<&EmbeddingRecord> =
        cluster.representatives.iter().map(|r| &r.record).collect();
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(&expected) {
        assert_eq!(a.path, e.path);
    }

    assert!(matches!(
        manager.unfreeze(&mut set, 2, 0.0, CAP),
        Err(FreezeError::NotFrozen { index: 2 })
    ));
}

#[test]
fn frozen_representative_lookup_follows_preferred_set() {
    let (manager, _) = freeze_p_group();
    assert_eq!(manager.frozen_representative_of("p3"), Some(2));
    assert_eq!(manager.frozen_representative_of("p19"), None);
    assert_eq!(manager.frozen_representative_of("q0"), None);
}

#[test]
fn apply_is_deterministic_for_identical_passes() {
    let build = || {
        let (mut manager, _) = freeze_p_group();
        let mut p_paths = paths("p", 0..18);
        p_paths.extend(paths("z", 0..5));
        let second = ClusterSet {
            clusters: vec![
                make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
                make_cluster(2, [1.0, 0.0], &p_paths),
            ],
            centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
        };
        let applied = manager.apply(second, 0.0, CAP);
        (
            applied
                .cluster(2)
                .unwrap()
                .representatives
                .iter()
                .map(|r| r.path().to_string())
                .collect::<Vec<_>>(),
            manager.frozen_indices(),
        )
    };

    assert_eq!(build(), build());
}

#[test]
fn frozen_cluster_stays_full_across_consecutive_passes() {
    let (mut manager, _) = freeze_p_group();

    // Pass 2: lose two originals.
    let mut remaining = paths("p", 0..14);
    remaining.extend(paths("x", 0..6));
    let second = ClusterSet {
        clusters: vec![
            make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
            make_cluster(2, [1.0, 0.0], &remaining.clone()),
        ],
        centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    };
    let applied = manager.apply(second, 0.0, CAP);
    assert_eq!(applied.cluster(2).unwrap().representatives.len(), CAP);
    assert_eq!(applied.cluster(2).unwrap().drift_count, 2);

    // Pass 3: lose two more; previous backfills count as carried
    // fillers, not replacements.
    let mut third_members = paths("p", 0..12);
    third_members.extend(paths("x", 0..6));
    let third = ClusterSet {
        clusters: vec![
            make_cluster(1, [0.0, 1.0], &paths("q", 0..25)),
            make_cluster(2, [1.0, 0.0], &third_members),
        ],
        centroids: vec![vec![0.0, 1.0], vec![1.0, 0.0]],
    };
    let applied = manager.apply(third, 0.0, CAP);
    let carried = applied.cluster(2).unwrap();
    assert_eq!(carried.representatives.len(), CAP);
    assert_eq!(carried.drift_count, 4, "drift counts originals, cumulatively");

    // x0/x1 were adopted into the preferred set in pass 2, so they are
    // carried fillers now, not flagged replacements; x2/x3 are fresh.
    for rep in &carried.representatives {
        match rep.path() {
            "x0" | "x1" => assert!(!rep.is_replacement),
            "x2" | "x3" => assert!(rep.is_replacement),
            _ => {}
        }
    }
    let flagged = carried.representatives.iter().filter(|r| r.is_replacement).count();
    assert_eq!(flagged, 2);
}
