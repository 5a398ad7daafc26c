//! Matching frozen groups to the clusters of a new pass.

use std::collections::BTreeMap;

use mosaic_core::models::ClusterSet;

use crate::manager::FrozenEntry;

/// One possible assignment of a frozen group to a new cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub old_index: usize,
    pub new_index: usize,
    /// `|new cluster members ∩ preferred paths|`.
    pub matched: usize,
}

/// Enumerate every `(old, new)` pair whose member overlap with the
/// group's preferred paths reaches `floor`.
pub(crate) fn enumerate(
    entries: &BTreeMap<usize, FrozenEntry>,
    set: &ClusterSet,
    floor: usize,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (&old_index, entry) in entries {
        for cluster in &set.clusters {
            let matched = cluster
                .members
                .iter()
                .filter(|m| entry.preferred_paths.contains(&m.path))
                .count();
            if matched >= floor {
                candidates.push(Candidate {
                    old_index,
                    new_index: cluster.id,
                    matched,
                });
            }
        }
    }
    candidates
}

/// Greedy bipartite assignment: walk candidates in descending match
/// order and accept a pair when neither side has been claimed.
///
/// Equal match counts order by ascending new index, then ascending old
/// index, so an identical pass always resolves identically.
pub(crate) fn assign_greedy(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.matched
            .cmp(&a.matched)
            .then(a.new_index.cmp(&b.new_index))
            .then(a.old_index.cmp(&b.old_index))
    });

    let mut accepted = Vec::new();
    let mut old_claimed = std::collections::BTreeSet::new();
    let mut new_claimed = std::collections::BTreeSet::new();
    for candidate in candidates {
        if old_claimed.contains(&candidate.old_index)
            || new_claimed.contains(&candidate.new_index)
        {
            continue;
        }
        old_claimed.insert(candidate.old_index);
        new_claimed.insert(candidate.new_index);
        accepted.push(candidate);
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(old_index: usize, new_index: usize, matched: usize) -> Candidate {
        Candidate {
            old_index,
            new_index,
            matched,
        }
    }

    #[test]
    fn highest_match_wins_contention() {
        let accepted = assign_greedy(vec![
            candidate(1, 3, 10),
            candidate(2, 3, 14),
        ]);
        assert_eq!(accepted, vec![candidate(2, 3, 14)]);
    }

    #[test]
    fn each_side_claimed_once() {
        let accepted = assign_greedy(vec![
            candidate(1, 1, 16),
            candidate(1, 2, 12),
            candidate(2, 1, 12),
            candidate(2, 2, 10),
        ]);
        assert_eq!(accepted, vec![candidate(1, 1, 16), candidate(2, 2, 10)]);
    }

    #[test]
    fn equal_matches_resolve_by_ascending_new_then_old_index() {
        let accepted = assign_greedy(vec![
            candidate(5, 2, 9),
            candidate(4, 2, 9),
            candidate(4, 1, 9),
        ]);
        // (4,1) first (lowest new index), then (5,2): 4 is claimed.
        assert_eq!(accepted, vec![candidate(4, 1, 9), candidate(5, 2, 9)]);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let input = vec![
            candidate(1, 2, 8),
            candidate(2, 1, 8),
            candidate(1, 1, 8),
            candidate(2, 2, 8),
        ];
        assert_eq!(assign_greedy(input.clone()), assign_greedy(input));
    }
}
