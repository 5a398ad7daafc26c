/// Freeze state machine errors.
#[derive(Debug, thiserror::Error)]
pub enum FreezeError {
    /// Freeze requires a full set of representatives.
    #[error("cluster {index} has {representatives} representatives, freeze requires {required}")]
    InsufficientMembers {
        index: usize,
        representatives: usize,
        required: usize,
    },

    /// Exclusion attempted on a path currently shown by a frozen cluster.
    #[error("{path} is a representative of frozen cluster {cluster_index}")]
    FrozenRepresentative { path: String, cluster_index: usize },

    #[error("cluster {index} is already frozen")]
    AlreadyFrozen { index: usize },

    #[error("cluster {index} is not frozen")]
    NotFrozen { index: usize },

    #[error("no cluster with index {index} in the current pass")]
    UnknownCluster { index: usize },
}
