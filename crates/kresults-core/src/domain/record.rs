//! Typed records produced by the ingestion pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::kernel::KernelVersion;

/// Marker stored when a filesystem run names no recognisable filesystem.
pub const UNKNOWN_FILESYSTEM: &str = "unknown";

/// Which test harness workflow a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// fstests run against one filesystem.
    Filesystem,
    /// Memory-management selftests.
    MemoryManagement,
    /// Bring-up run of the harness itself.
    Integration,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem => write!(f, "filesystem"),
            Self::MemoryManagement => write!(f, "memory-management"),
            Self::Integration => write!(f, "integration"),
        }
    }
}

/// One named suite execution within a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestProfile {
    pub name: String,
    pub test_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
    pub duration_seconds: u64,
    /// Failing test identifiers in report order, duplicates kept.
    pub failures: Vec<String>,
}

impl TestProfile {
    /// Declared failure count disagrees with the extracted list.
    pub fn has_count_mismatch(&self) -> bool {
        self.failure_count != self.failures.len() as u64
    }
}

/// Profiles of one report, in the order they appear in the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSet(Vec<TestProfile>);

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile. A repeated name replaces the earlier entry in place.
    pub fn insert(&mut self, profile: TestProfile) {
        match self.0.iter_mut().find(|p| p.name == profile.name) {
            Some(slot) => *slot = profile,
            None => self.0.push(profile),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TestProfile> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestProfile> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `test_id` fails in any profile of this set.
    pub fn fails_anywhere(&self, test_id: &str) -> bool {
        self.0
            .iter()
            .any(|p| p.failures.iter().any(|f| f == test_id))
    }
}

impl FromIterator<TestProfile> for ProfileSet {
    fn from_iter<I: IntoIterator<Item = TestProfile>>(iter: I) -> Self {
        let mut set = ProfileSet::new();
        for profile in iter {
            set.insert(profile);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ProfileSet {
    type Item = &'a TestProfile;
    type IntoIter = std::slice::Iter<'a, TestProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Run-level totals, either declared by the report or synthesized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub test_count: u64,
    pub skipped_count: u64,
    pub failure_count: u64,
    pub error_count: u64,
    pub duration_seconds: u64,
}

impl Totals {
    /// Field-wise sum over `profiles`, saturating at `u64::MAX`.
    /// Synthesized totals never carry errors.
    pub fn sum_of(profiles: &ProfileSet) -> Self {
        profiles.iter().fold(Totals::default(), |acc, p| Totals {
            test_count: acc.test_count.saturating_add(p.test_count),
            skipped_count: acc.skipped_count.saturating_add(p.skipped_count),
            failure_count: acc.failure_count.saturating_add(p.failure_count),
            error_count: 0,
            duration_seconds: acc.duration_seconds.saturating_add(p.duration_seconds),
        })
    }
}

/// Pass/total counters of one selftest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelftestCount {
    pub passed: u64,
    pub total: u64,
    pub failed: u64,
}

impl SelftestCount {
    pub fn new(passed: u64, total: u64) -> Self {
        Self {
            passed,
            total,
            failed: total.saturating_sub(passed),
        }
    }
}

/// Memory-management selftest results keyed by lower-cased test name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelftestResults {
    pub kernel: BTreeMap<String, SelftestCount>,
    pub userspace: BTreeMap<String, SelftestCount>,
}

impl SelftestResults {
    pub fn is_empty(&self) -> bool {
        self.kernel.is_empty() && self.userspace.is_empty()
    }

    fn all(&self) -> impl Iterator<Item = &SelftestCount> {
        self.kernel.values().chain(self.userspace.values())
    }

    pub fn total_failures(&self) -> u64 {
        self.all().fold(0, |acc, c| acc.saturating_add(c.failed))
    }

    pub fn total_tests(&self) -> u64 {
        self.all().fold(0, |acc, c| acc.saturating_add(c.total))
    }

    pub fn to_totals(&self) -> Totals {
        Totals {
            test_count: self.total_tests(),
            failure_count: self.total_failures(),
            ..Totals::default()
        }
    }
}

/// Fields only some report kinds carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<String>,
    /// Sequence number of same-day integration runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selftests: Option<SelftestResults>,
}

/// Where a record's artifacts live: one family per filesystem, plus one
/// each for memory-management and integration runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFamily {
    Filesystem(String),
    MemoryManagement,
    Integration,
}

impl ReportFamily {
    pub fn dir_name(&self) -> &str {
        match self {
            Self::Filesystem(fs) => fs.as_str(),
            Self::MemoryManagement => "mm",
            Self::Integration => "kdevops",
        }
    }
}

impl fmt::Display for ReportFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One processed commit. Created once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub commit_id: String,
    pub subject: String,
    /// Author date as reported by git (`%ai`).
    pub date: String,
    pub kernel: KernelVersion,
    /// Subject announces an official tagged release.
    pub official_release: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    pub test_kind: TestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<String>,
    pub profiles: ProfileSet,
    pub totals: Totals,
    #[serde(flatten)]
    pub extra: KindFields,
}

impl CommitRecord {
    pub fn family(&self) -> ReportFamily {
        match self.test_kind {
            TestKind::Filesystem => ReportFamily::Filesystem(
                self.filesystem
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_FILESYSTEM.to_string()),
            ),
            TestKind::MemoryManagement => ReportFamily::MemoryManagement,
            TestKind::Integration => ReportFamily::Integration,
        }
    }

    /// Calendar day of the author date, e.g. `2025-03-21`.
    pub fn day(&self) -> Option<&str> {
        self.date.split_whitespace().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, failures: &[&str]) -> TestProfile {
        TestProfile {
            name: name.to_string(),
            test_count: 10,
            failure_count: failures.len() as u64,
            skipped_count: 1,
            duration_seconds: 60,
            failures: failures.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn profile_set_keeps_first_position_on_duplicate_name() {
        let mut set = ProfileSet::new();
        set.insert(profile("xfs_crc", &["generic/001"]));
        set.insert(profile("xfs_reflink", &[]));
        set.insert(profile("xfs_crc", &["generic/002"]));

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["xfs_crc", "xfs_reflink"]);
        assert_eq!(set.get("xfs_crc").unwrap().failures, vec!["generic/002"]);
    }

    #[test]
    fn fails_anywhere_scans_every_profile() {
        let set: ProfileSet = vec![profile("a", &["t1"]), profile("b", &["t2"])]
            .into_iter()
            .collect();
        assert!(set.fails_anywhere("t2"));
        assert!(!set.fails_anywhere("t3"));
    }

    #[test]
    fn synthesized_totals_have_no_errors() {
        let set: ProfileSet = vec![profile("a", &["t1"]), profile("b", &["t2", "t3"])]
            .into_iter()
            .collect();
        let totals = Totals::sum_of(&set);
        assert_eq!(totals.test_count, 20);
        assert_eq!(totals.failure_count, 3);
        assert_eq!(totals.skipped_count, 2);
        assert_eq!(totals.duration_seconds, 120);
        assert_eq!(totals.error_count, 0);
    }

    #[test]
    fn synthesized_totals_saturate() {
        let mut huge = profile("a", &["t1"]);
        huge.test_count = u64::MAX;
        huge.duration_seconds = u64::MAX - 1;
        let set: ProfileSet = vec![huge, profile("b", &["t2"])].into_iter().collect();
        let totals = Totals::sum_of(&set);
        assert_eq!(totals.test_count, u64::MAX);
        assert_eq!(totals.duration_seconds, u64::MAX);
        assert_eq!(totals.failure_count, 2);
    }

    #[test]
    fn selftest_sums_saturate() {
        let mut results = SelftestResults::default();
        results
            .kernel
            .insert("ksm".to_string(), SelftestCount::new(0, u64::MAX));
        results
            .userspace
            .insert("cow".to_string(), SelftestCount::new(0, 5));
        assert_eq!(results.total_tests(), u64::MAX);
        assert_eq!(results.total_failures(), u64::MAX);
    }

    #[test]
    fn count_mismatch_is_detectable() {
        let mut p = profile("a", &["t1", "t2"]);
        assert!(!p.has_count_mismatch());
        p.failure_count = 3;
        assert!(p.has_count_mismatch());
    }

    #[test]
    fn selftest_counts_saturate() {
        let c = SelftestCount::new(12, 10);
        assert_eq!(c.failed, 0);
        let c = SelftestCount::new(7, 10);
        assert_eq!(c.failed, 3);
    }

    #[test]
    fn family_dir_names() {
        assert_eq!(ReportFamily::Filesystem("xfs".into()).dir_name(), "xfs");
        assert_eq!(ReportFamily::MemoryManagement.dir_name(), "mm");
        assert_eq!(ReportFamily::Integration.dir_name(), "kdevops");
    }
}
