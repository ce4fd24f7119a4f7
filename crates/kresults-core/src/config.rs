//! Configuration loaded from TOML.
//!
//! Every table has defaults matching the harness conventions, so an empty
//! file (or no file at all) yields a working configuration. The policy tables
//! live here rather than in the classifier so they can be audited and
//! overridden without touching parsing code.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{KresultsError, Result};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "KRESULTS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KresultsConfig {
    pub classifier: ClassifierConfig,
    pub filesystems: Vec<FilesystemPattern>,
    pub fs_exclusion: FsExclusionPolicy,
    pub output: OutputConfig,
}

impl Default for KresultsConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            filesystems: default_filesystems(),
            fs_exclusion: FsExclusionPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Subject markers and workflow names that drive classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Subject prefix of harness bring-up runs.
    pub integration_prefix: String,
    /// Marks harness self-verification commits; those are never relevant.
    pub verification_marker: String,
    /// Subject substring of memory-management runs.
    pub mm_marker: String,
    pub fstests_workflow: String,
    pub selftests_workflow: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            integration_prefix: "kdevops:".to_string(),
            verification_marker: "CI:".to_string(),
            mm_marker: "linux-mm-kpd:".to_string(),
            fstests_workflow: "fstests".to_string(),
            selftests_workflow: "selftests".to_string(),
        }
    }
}

/// A filesystem and the case-insensitive patterns that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemPattern {
    pub name: String,
    pub patterns: Vec<String>,
}

impl FilesystemPattern {
    fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: owned(patterns),
        }
    }
}

fn default_filesystems() -> Vec<FilesystemPattern> {
    vec![
        FilesystemPattern::new("ext4", &["ext4", "linux-ext4"]),
        FilesystemPattern::new("btrfs", &["btrfs", "linux-btrfs"]),
        FilesystemPattern::new("xfs", &["xfs", "linux-xfs"]),
    ]
}

/// Which filesystem reports are pipeline self-checks rather than real
/// filesystem validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsExclusionPolicy {
    pub bringup_prefixes: Vec<String>,
    pub plumbing_trees: Vec<String>,
    pub plumbing_subjects: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FsExclusionPolicy {
    fn default() -> Self {
        Self {
            bringup_prefixes: owned(&["kdevops:", "kdevops-kpd:"]),
            plumbing_trees: owned(&["linux", "linux-next", "linux-stable"]),
            plumbing_subjects: owned(&[
                "linux-xfs-kpd",
                "linux-ext4-kpd",
                "linux-btrfs-kpd",
                "linux-tmpfs-kpd",
            ]),
        }
    }
}

/// Why a filesystem report is kept out of the per-filesystem dashboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    BringupSubject(String),
    PlumbingSelfCheck { tree: String },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BringupSubject(prefix) => write!(f, "bring-up subject ({prefix})"),
            Self::PlumbingSelfCheck { tree } => write!(f, "plumbing self-check on tree {tree}"),
        }
    }
}

impl FsExclusionPolicy {
    pub fn check(&self, tree: Option<&str>, subject: &str) -> Option<ExclusionReason> {
        if let Some(prefix) = self
            .bringup_prefixes
            .iter()
            .find(|p| subject.starts_with(p.as_str()))
        {
            return Some(ExclusionReason::BringupSubject(prefix.clone()));
        }

        let tree = tree?;
        let plumbing_tree = self.plumbing_trees.iter().any(|t| t == tree);
        let plumbing_subject = self.plumbing_subjects.iter().any(|s| s == subject);
        if plumbing_tree && plumbing_subject {
            return Some(ExclusionReason::PlumbingSelfCheck {
                tree: tree.to_string(),
            });
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("dashboard"),
        }
    }
}

impl KresultsConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: KresultsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            KresultsError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Explicit path, then `KRESULTS_CONFIG`, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => {
                debug!("no configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.classifier.fstests_workflow.is_empty() {
            return Err(KresultsError::Config(
                "classifier.fstests_workflow cannot be empty".to_string(),
            ));
        }
        if self.classifier.selftests_workflow.is_empty() {
            return Err(KresultsError::Config(
                "classifier.selftests_workflow cannot be empty".to_string(),
            ));
        }
        for fs in &self.filesystems {
            if fs.name.is_empty() || fs.patterns.is_empty() {
                return Err(KresultsError::Config(format!(
                    "filesystem entry {:?} needs a name and at least one pattern",
                    fs.name
                )));
            }
            for pattern in &fs.patterns {
                regex::Regex::new(pattern).map_err(|e| {
                    KresultsError::Config(format!("bad pattern for {}: {e}", fs.name))
                })?;
            }
        }
        Ok(())
    }
}
