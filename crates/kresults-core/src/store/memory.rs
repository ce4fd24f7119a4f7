//! In-memory artifact store for tests and embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::ArtifactStore;
use crate::domain::{CommitRecord, KresultsError, ReportFamily, Result};
use crate::index::ReleaseIndex;

#[derive(Debug, Default)]
struct Contents {
    records: HashMap<ReportFamily, BTreeMap<String, CommitRecord>>,
    indexes: HashMap<ReportFamily, ReleaseIndex>,
}

/// Artifact store backed by maps behind a `Mutex`.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    contents: Mutex<Contents>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Contents>> {
        self.contents
            .lock()
            .map_err(|_| KresultsError::Storage("memory store lock poisoned".to_string()))
    }

    /// Total number of stored records across every family.
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.lock()?.records.values().map(BTreeMap::len).sum())
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn exists(&self, family: &ReportFamily, identity: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .records
            .get(family)
            .is_some_and(|f| f.contains_key(identity)))
    }

    fn load_record(&self, family: &ReportFamily, identity: &str) -> Result<Option<CommitRecord>> {
        Ok(self
            .lock()?
            .records
            .get(family)
            .and_then(|f| f.get(identity))
            .cloned())
    }

    fn write_record(
        &self,
        family: &ReportFamily,
        identity: &str,
        record: &CommitRecord,
    ) -> Result<()> {
        self.lock()?
            .records
            .entry(family.clone())
            .or_default()
            .insert(identity.to_string(), record.clone());
        Ok(())
    }

    fn list_identities(&self, family: &ReportFamily) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .records
            .get(family)
            .map(|f| f.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn write_index(&self, index: &ReleaseIndex) -> Result<()> {
        self.lock()?
            .indexes
            .insert(index.family.clone(), index.clone());
        Ok(())
    }

    fn read_index(&self, family: &ReportFamily) -> Result<Option<ReleaseIndex>> {
        Ok(self.lock()?.indexes.get(family).cloned())
    }
}
