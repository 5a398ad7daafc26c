//! Error display and composition tests.

use mosaic_core::errors::{
    EmbeddingError, FreezeError, MosaicError, StoreError,
};

#[test]
fn store_error_messages() {
    let err = StoreError::DimensionMismatch {
        expected: 512,
        actual: 384,
        path: "img/a.jpg".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("512"));
    assert!(msg.contains("384"));
    assert!(msg.contains("img/a.jpg"));
}

#[test]
fn freeze_errors_name_the_cluster() {
    let err = FreezeError::InsufficientMembers {
        index: 3,
        representatives: 9,
        required: 16,
    };
    assert!(err.to_string().contains("cluster 3"));

    let err = FreezeError::FrozenRepresentative {
        path: "img/pinned.jpg".to_string(),
        cluster_index: 2,
    };
    assert!(err.to_string().contains("frozen cluster 2"));
}

#[test]
fn subsystem_errors_convert_to_top_level() {
    let err: MosaicError = StoreError::PersistenceFailed {
        reason: "disk full".to_string(),
    }
    .into();
    assert!(matches!(err, MosaicError::Store(_)));

    let err: MosaicError = EmbeddingError::InferenceFailed {
        reason: "session died".to_string(),
    }
    .into();
    assert!(matches!(err, MosaicError::Embedding(_)));
}

#[test]
fn transparent_variants_preserve_messages() {
    let inner = FreezeError::NotFrozen { index: 5 };
    let expected = inner.to_string();
    let outer: MosaicError = inner.into();
    assert_eq!(outer.to_string(), expected);
}
