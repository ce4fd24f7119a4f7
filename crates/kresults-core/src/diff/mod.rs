//! Regression/fix differencing between two runs.
//!
//! This module provides:
//! - Per-profile failure-set comparison with cross-profile fix suppression
//!   (`profiles` submodule)
//! - Record-level entry point that refuses to compare different test kinds

pub mod profiles;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{CommitRecord, KresultsError, Result};

pub use profiles::diff_profiles;

/// Per-test annotation used by verbose output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// Fails in the candidate only.
    Regression,
    /// Failed in the baseline and fails nowhere in the candidate.
    Fix,
    /// Fails in this profile on both sides.
    Fail,
    /// No longer fails in this profile but still fails in another one.
    Pass,
}

impl TestOutcome {
    pub fn marker(self) -> char {
        match self {
            Self::Regression => '+',
            Self::Fix => '-',
            Self::Fail => '!',
            Self::Pass => ' ',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Fix => "fix",
            Self::Fail => "fail",
            Self::Pass => "pass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAnnotation {
    pub test: String,
    pub outcome: TestOutcome,
}

/// Delta of one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDiff {
    pub profile: String,
    pub regressions: BTreeSet<String>,
    pub fixes: BTreeSet<String>,
    pub unchanged: BTreeSet<String>,
    /// Filled only for verbose comparisons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<TestAnnotation>,
}

impl ProfileDiff {
    pub fn has_changes(&self) -> bool {
        !self.regressions.is_empty() || !self.fixes.is_empty()
    }
}

/// Result of comparing a baseline run against a candidate run. Computed
/// fresh for every comparison and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDiff {
    /// Reported profiles, sorted by name.
    pub profiles: Vec<ProfileDiff>,
    pub total_regressions: usize,
    pub total_fixes: usize,
    /// Accumulated over every profile, reported or not.
    pub total_unchanged: usize,
    /// Number of distinct profile names seen on either side.
    pub profiles_compared: usize,
}

impl RunDiff {
    pub fn has_changes(&self) -> bool {
        self.total_regressions > 0 || self.total_fixes > 0
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileDiff> {
        self.profiles.iter().find(|p| p.profile == name)
    }
}

/// Compare two records of the same test kind.
pub fn diff_records(
    baseline: &CommitRecord,
    candidate: &CommitRecord,
    verbose: bool,
) -> Result<RunDiff> {
    if baseline.test_kind != candidate.test_kind {
        return Err(KresultsError::KindMismatch {
            baseline: baseline.test_kind,
            candidate: candidate.test_kind,
        });
    }
    Ok(diff_profiles(&baseline.profiles, &candidate.profiles, verbose))
}
