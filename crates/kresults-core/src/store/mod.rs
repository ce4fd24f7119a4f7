//! Persistence boundary for records and family indexes.
//!
//! Records are addressed by `(family, identity)`. The identity is minted by
//! [`crate::naming`]; the store only needs to answer whether one is taken.
//! No locking is performed: one writer per output location at a time.

pub mod fs;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{CommitRecord, ReportFamily, Result};
use crate::index::ReleaseIndex;

pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;

/// Address of one persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub family: ReportFamily,
    pub identity: String,
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family.dir_name(), self.identity)
    }
}

/// Record and index storage interface.
pub trait ArtifactStore: Send + Sync {
    /// Whether a record with this identity already exists in `family`.
    fn exists(&self, family: &ReportFamily, identity: &str) -> Result<bool>;

    /// Load a stored record. `Ok(None)` when there is none.
    fn load_record(&self, family: &ReportFamily, identity: &str) -> Result<Option<CommitRecord>>;

    /// Store `record` under `identity`, replacing any previous content.
    fn write_record(&self, family: &ReportFamily, identity: &str, record: &CommitRecord)
        -> Result<()>;

    /// Identities stored in `family`, sorted.
    fn list_identities(&self, family: &ReportFamily) -> Result<Vec<String>>;

    fn write_index(&self, index: &ReleaseIndex) -> Result<()>;

    fn read_index(&self, family: &ReportFamily) -> Result<Option<ReleaseIndex>>;
}
