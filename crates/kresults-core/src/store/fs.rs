use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use super::ArtifactStore;
use crate::domain::{CommitRecord, KresultsError, ReportFamily, Result};
use crate::index::ReleaseIndex;

const INDEX_FILE: &str = "index.json";
const RECORD_EXT: &str = "json";

/// Filesystem-backed artifact store.
///
/// Layout: `<root>/<family>/<identity>.json` plus `<root>/<family>/index.json`.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root`. Creates `root` if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn family_dir(&self, family: &ReportFamily) -> PathBuf {
        self.root.join(family.dir_name())
    }

    pub fn record_path(&self, family: &ReportFamily, identity: &str) -> Result<PathBuf> {
        check_identity(identity)?;
        Ok(self
            .family_dir(family)
            .join(format!("{identity}.{RECORD_EXT}")))
    }

    fn index_path(&self, family: &ReportFamily) -> PathBuf {
        self.family_dir(family).join(INDEX_FILE)
    }
}

fn check_identity(identity: &str) -> Result<()> {
    let reserved = format!("{identity}.{RECORD_EXT}") == INDEX_FILE;
    if identity.is_empty()
        || identity.starts_with('.')
        || identity.contains(|c: char| c == '/' || c == '\\')
        || reserved
    {
        return Err(KresultsError::Storage(format!(
            "unusable artifact identity {identity:?}"
        )));
    }
    Ok(())
}

/// Write pretty JSON to a temp file in the target directory, then rename it
/// over `path`.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| KresultsError::Storage(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(dir)?;

    let content = serde_json::to_string_pretty(value)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), "artifact written");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| KresultsError::Storage(format!("{} is not valid: {e}", path.display())))
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, family: &ReportFamily, identity: &str) -> Result<bool> {
        Ok(self.record_path(family, identity)?.exists())
    }

    fn load_record(&self, family: &ReportFamily, identity: &str) -> Result<Option<CommitRecord>> {
        read_json(&self.record_path(family, identity)?)
    }

    fn write_record(
        &self,
        family: &ReportFamily,
        identity: &str,
        record: &CommitRecord,
    ) -> Result<()> {
        write_json_atomic(&self.record_path(family, identity)?, record)
    }

    fn list_identities(&self, family: &ReportFamily) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.family_dir(family)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut identities = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.starts_with('.') => identities.push(stem.to_string()),
                _ => {}
            }
        }
        identities.sort();
        Ok(identities)
    }

    fn write_index(&self, index: &ReleaseIndex) -> Result<()> {
        write_json_atomic(&self.index_path(&index.family), index)
    }

    fn read_index(&self, family: &ReportFamily) -> Result<Option<ReleaseIndex>> {
        read_json(&self.index_path(family))
    }
}
