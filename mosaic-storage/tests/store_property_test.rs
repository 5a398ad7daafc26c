//! Property tests: put/scan round-trips and exclusion set algebra.

use proptest::prelude::*;

use mosaic_core::traits::RecordPersistence;
use mosaic_storage::{ImageStore, SqliteStore};
use test_fixtures::record;

proptest! {
    #[test]
    fn prop_put_scan_roundtrip(
        vector in prop::collection::vec(-100.0f32..100.0, 1..64),
        path in "[a-z0-9/]{1,40}\\.jpg",
    ) {
        let backend = SqliteStore::open_in_memory().unwrap();
        let rec = record(&path, vector.clone());
        backend.put("p", &rec).unwrap();

        let stored = backend.records_for("p").unwrap();
        prop_assert_eq!(stored.len(), 1);
        prop_assert_eq!(&stored[0].path, &path);
        prop_assert_eq!(&stored[0].vector, &vector);
    }

    #[test]
    fn prop_valid_is_records_minus_exclusions(
        count in 1usize..30,
        excluded_indices in prop::collection::btree_set(0usize..30, 0..10),
    ) {
        let backend = SqliteStore::open_in_memory().unwrap();
        let mut store = ImageStore::new("p", Box::new(backend));

        let records: Vec<_> = (0..count)
            .map(|i| record(&format!("img/{i}.jpg"), vec![i as f32, 1.0]))
            .collect();
        store.put_many(records).unwrap();

        let excluded: Vec<String> = excluded_indices
            .iter()
            .filter(|&&i| i < count)
            .map(|i| format!("img/{i}.jpg"))
            .collect();
        for path in &excluded {
            store.exclude(path);
        }

        let valid = store.valid();
        prop_assert_eq!(valid.len(), count - excluded.len());
        for r in &valid {
            prop_assert!(!excluded.contains(&r.path));
        }
    }

    #[test]
    fn prop_exclude_restore_is_identity(
        count in 1usize..20,
        target in 0usize..20,
    ) {
        let backend = SqliteStore::open_in_memory().unwrap();
        let mut store = ImageStore::new("p", Box::new(backend));
        store
            .put_many((0..count).map(|i| record(&format!("{i}"), vec![i as f32])).collect())
            .unwrap();

        let before = store.valid();
        let path = format!("{}", target % count);
        store.exclude(&path);
        store.restore(&path);
        prop_assert_eq!(store.valid(), before);
    }
}
