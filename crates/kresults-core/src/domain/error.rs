//! Domain-level error taxonomy for kresults.
//!
//! Classification misses, parse gaps and naming collisions are normal
//! outcomes and never show up here.

use super::record::TestKind;

/// kresults domain errors.
#[derive(Debug, thiserror::Error)]
pub enum KresultsError {
    #[error("failed to retrieve commit {commit}: {reason}")]
    Retrieval { commit: String, reason: String },

    #[error("git error: {0}")]
    GitError(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid TOML configuration: {0}")]
    TomlConfig(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cannot compare a {baseline} report against a {candidate} report")]
    KindMismatch {
        baseline: TestKind,
        candidate: TestKind,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl KresultsError {
    pub fn retrieval(commit: &str, reason: impl Into<String>) -> Self {
        Self::Retrieval {
            commit: commit.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures that only affect the one commit being fetched.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Retrieval { .. })
    }
}

/// Result type for kresults domain operations.
pub type Result<T> = std::result::Result<T, KresultsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_error_display() {
        let err = KresultsError::retrieval("deadbeef", "unknown revision");
        let msg = err.to_string();
        assert!(msg.contains("deadbeef"));
        assert!(msg.contains("unknown revision"));
        assert!(err.is_retrieval());
    }

    #[test]
    fn test_kind_mismatch_error() {
        let err = KresultsError::KindMismatch {
            baseline: TestKind::Filesystem,
            candidate: TestKind::MemoryManagement,
        };
        let msg = err.to_string();
        assert!(msg.contains("filesystem"));
        assert!(msg.contains("memory-management"));
        assert!(!err.is_retrieval());
    }

    #[test]
    fn test_storage_error() {
        let err = KresultsError::Storage("index.json is not valid".to_string());
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("index.json"));
    }
}
