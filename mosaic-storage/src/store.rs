//! The in-memory authoritative store: path -> record, plus exclusions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::{debug, info, warn};

use mosaic_core::errors::{MosaicResult, StoreError};
use mosaic_core::models::{EmbeddingRecord, ProjectManifest};
use mosaic_core::traits::RecordPersistence;

/// Authoritative mapping from image path to its embedding record,
/// together with the user's exclusion set. Owned by the orchestrating
/// context; workers only ever see cloned snapshots.
pub struct ImageStore {
    project: String,
    records: BTreeMap<String, EmbeddingRecord>,
    excluded: BTreeSet<String>,
    /// Embedding width, fixed by the first record of the session.
    dimensions: Option<usize>,
    backend: Box<dyn RecordPersistence>,
}

impl ImageStore {
    /// Create an empty store for a project.
    pub fn new(project: impl Into<String>, backend: Box<dyn RecordPersistence>) -> Self {
        Self {
            project: project.into(),
            records: BTreeMap::new(),
            excluded: BTreeSet::new(),
            dimensions: None,
            backend,
        }
    }

    /// Reconstruct a prior session from the backend. A missing or
    /// corrupt manifest means no exclusions; stored records are loaded
    /// either way.
    pub fn load(
        project: impl Into<String>,
        backend: Box<dyn RecordPersistence>,
    ) -> MosaicResult<Self> {
        let project = project.into();
        let stored = backend.records_for(&project)?;
        let manifest = backend.manifest_for(&project)?;

        let mut store = Self::new(project.clone(), backend);
        if !stored.is_empty() {
            store.insert_all(stored)?;
        }
        if let Some(manifest) = manifest {
            store.excluded = manifest.excluded_images.into_iter().collect();
        }

        info!(
            project,
            records = store.records.len(),
            excluded = store.excluded.len(),
            "store loaded"
        );
        Ok(store)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Embedding width of this session, once the first record arrived.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Insert or replace records by path.
    pub fn put_many(&mut self, records: Vec<EmbeddingRecord>) -> MosaicResult<()> {
        self.insert_all(records)
    }

    fn insert_all(&mut self, records: Vec<EmbeddingRecord>) -> MosaicResult<()> {
        // Validate the whole batch before mutating, so readers never
        // observe a partial insert. The first record ever seen fixes
        // the session dimension.
        let mut expected = self.dimensions;
        for record in &records {
            let want = *expected.get_or_insert(record.dimensions());
            if record.dimensions() != want {
                return Err(StoreError::DimensionMismatch {
                    expected: want,
                    actual: record.dimensions(),
                    path: record.path.clone(),
                }
                .into());
            }
        }

        self.dimensions = expected;
        for record in records {
            self.records.insert(record.path.clone(), record);
        }
        Ok(())
    }

    /// All records, in stable (path) order.
    pub fn all(&self) -> impl Iterator<Item = &EmbeddingRecord> {
        self.records.values()
    }

    /// Snapshot of the non-excluded records: the input to clustering.
    pub fn valid(&self) -> Vec<EmbeddingRecord> {
        self.records
            .values()
            .filter(|r| !self.excluded.contains(&r.path))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Paths already embedded; the producer skips these.
    pub fn processed_paths(&self) -> BTreeSet<String> {
        self.records.keys().cloned().collect()
    }

    /// Add a path to the exclusion set. Idempotent; paths may be
    /// excluded before their record exists. Returns whether the set
    /// changed.
    pub fn exclude(&mut self, path: &str) -> bool {
        let changed = self.excluded.insert(path.to_string());
        if changed {
            debug!(path, "path excluded");
        }
        changed
    }

    /// Remove a path from the exclusion set. Idempotent.
    pub fn restore(&mut self, path: &str) -> bool {
        let changed = self.excluded.remove(path);
        if changed {
            debug!(path, "path restored");
        }
        changed
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.contains(path)
    }

    pub fn excluded_paths(&self) -> Vec<String> {
        self.excluded.iter().cloned().collect()
    }

    /// Write the full snapshot and manifest to the backend. A failure
    /// leaves the in-memory view intact; the caller may retry at the
    /// next flush.
    pub fn persist(&self, total_images_found: usize) -> MosaicResult<()> {
        let records: Vec<EmbeddingRecord> = self.records.values().cloned().collect();
        if let Err(e) = self.backend.put_many(&self.project, &records) {
            warn!(project = %self.project, error = %e, "record persist failed");
            return Err(e);
        }

        let manifest = ProjectManifest {
            processed_count: self.records.len(),
            total_images_found,
            excluded_images: self.excluded_paths(),
            last_updated: Utc::now().timestamp_millis(),
        };
        if let Err(e) = self.backend.put_manifest(&self.project, &manifest) {
            warn!(project = %self.project, error = %e, "manifest persist failed");
            return Err(e);
        }

        debug!(
            project = %self.project,
            records = records.len(),
            "store persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::errors::MosaicError;

    /// Backend that stores nothing and never fails.
    struct NullBackend;

    impl RecordPersistence for NullBackend {
        fn put(&self, _: &str, _: &EmbeddingRecord) -> MosaicResult<()> {
            Ok(())
        }
        fn put_many(&self, _: &str, _: &[EmbeddingRecord]) -> MosaicResult<()> {
            Ok(())
        }
        fn records_for(&self, _: &str) -> MosaicResult<Vec<EmbeddingRecord>> {
            Ok(vec![])
        }
        fn put_manifest(&self, _: &str, _: &ProjectManifest) -> MosaicResult<()> {
            Ok(())
        }
        fn manifest_for(&self, _: &str) -> MosaicResult<Option<ProjectManifest>> {
            Ok(None)
        }
    }

    fn store() -> ImageStore {
        ImageStore::new("test", Box::new(NullBackend))
    }

    #[test]
    fn put_many_replaces_by_path() {
        let mut s = store();
        s.put_many(vec![EmbeddingRecord::new("a", vec![1.0, 0.0])])
            .unwrap();
        s.put_many(vec![EmbeddingRecord::new("a", vec![0.0, 1.0])])
            .unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.all().next().unwrap().vector, vec![0.0, 1.0]);
    }

    #[test]
    fn dimension_fixed_by_first_record() {
        let mut s = store();
        s.put_many(vec![EmbeddingRecord::new("a", vec![1.0, 0.0])])
            .unwrap();
        let err = s
            .put_many(vec![EmbeddingRecord::new("b", vec![1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            MosaicError::Store(StoreError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            })
        ));
        // The failed batch must not have been applied.
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn mixed_batch_rejected_whole() {
        let mut s = store();
        let err = s.put_many(vec![
            EmbeddingRecord::new("a", vec![1.0, 0.0]),
            EmbeddingRecord::new("b", vec![1.0]),
        ]);
        assert!(err.is_err());
        assert!(s.is_empty());
    }

    #[test]
    fn exclude_and_restore_are_idempotent() {
        let mut s = store();
        s.put_many(vec![EmbeddingRecord::new("a", vec![1.0])]).unwrap();

        assert!(s.exclude("a"));
        assert!(!s.exclude("a"));
        assert!(s.is_excluded("a"));

        assert!(s.restore("a"));
        assert!(!s.restore("a"));
        assert!(!s.is_excluded("a"));
    }

    #[test]
    fn preemptive_exclusion_allowed() {
        let mut s = store();
        s.exclude("future.jpg");
        s.put_many(vec![EmbeddingRecord::new("future.jpg", vec![1.0])])
            .unwrap();
        assert!(s.valid().is_empty());
    }

    #[test]
    fn valid_filters_exclusions() {
        let mut s = store();
        s.put_many(vec![
            EmbeddingRecord::new("a", vec![1.0]),
            EmbeddingRecord::new("b", vec![2.0]),
        ])
        .unwrap();
        s.exclude("a");

        let valid = s.valid();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].path, "b");
    }

    #[test]
    fn exclude_restore_roundtrip_restores_valid_set() {
        let mut s = store();
        s.put_many(vec![
            EmbeddingRecord::new("a", vec![1.0]),
            EmbeddingRecord::new("b", vec![2.0]),
        ])
        .unwrap();

        let before = s.valid();
        s.exclude("a");
        s.restore("a");
        assert_eq!(s.valid(), before);
    }
}
