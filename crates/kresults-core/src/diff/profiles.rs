use std::collections::BTreeSet;

use crate::domain::{ProfileSet, TestProfile};

use super::{ProfileDiff, RunDiff, TestAnnotation, TestOutcome};

fn failure_set(profile: Option<&TestProfile>) -> BTreeSet<&str> {
    profile
        .map(|p| p.failures.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn observed(profile: Option<&TestProfile>) -> bool {
    profile.is_some_and(|p| p.test_count > 0 || !p.failures.is_empty())
}

fn owned<'a>(items: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    items.map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Per-profile comparison
// ---------------------------------------------------------------------------

/// Compare the failure sets of every profile named on either side.
///
/// A test that stopped failing in one profile only counts as a fix when it
/// fails in no candidate profile at all; otherwise it stays unchanged. A
/// profile missing on one side has an empty failure set there.
///
/// Without `verbose` only profiles with regressions or fixes are reported.
/// With it, every profile with at least one observed test is reported and
/// each failing test carries a [`TestOutcome`].
pub fn diff_profiles(baseline: &ProfileSet, candidate: &ProfileSet, verbose: bool) -> RunDiff {
    let names: BTreeSet<&str> = baseline.names().chain(candidate.names()).collect();
    let mut diff = RunDiff {
        profiles_compared: names.len(),
        ..RunDiff::default()
    };

    for name in names {
        let base_profile = baseline.get(name);
        let cand_profile = candidate.get(name);
        let base = failure_set(base_profile);
        let cand = failure_set(cand_profile);

        let regressions = owned(cand.difference(&base).copied());
        let fixes = owned(
            base.difference(&cand)
                .copied()
                .filter(|t| !candidate.fails_anywhere(t)),
        );
        let unchanged = owned(
            base.union(&cand)
                .copied()
                .filter(|t| !regressions.contains(*t) && !fixes.contains(*t)),
        );

        diff.total_regressions += regressions.len();
        diff.total_fixes += fixes.len();
        diff.total_unchanged += unchanged.len();

        let mut entry = ProfileDiff {
            profile: name.to_string(),
            regressions,
            fixes,
            unchanged,
            annotations: Vec::new(),
        };

        if verbose {
            if !(observed(base_profile) || observed(cand_profile)) {
                continue;
            }
            entry.annotations = base
                .union(&cand)
                .map(|t| TestAnnotation {
                    test: t.to_string(),
                    outcome: outcome_of(&entry, &cand, t),
                })
                .collect();
            diff.profiles.push(entry);
        } else if entry.has_changes() {
            diff.profiles.push(entry);
        }
    }

    diff
}

fn outcome_of(entry: &ProfileDiff, candidate_failures: &BTreeSet<&str>, test: &str) -> TestOutcome {
    if entry.regressions.contains(test) {
        TestOutcome::Regression
    } else if entry.fixes.contains(test) {
        TestOutcome::Fix
    } else if candidate_failures.contains(test) {
        TestOutcome::Fail
    } else {
        TestOutcome::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, failures: &[&str]) -> TestProfile {
        TestProfile {
            name: name.to_string(),
            test_count: 100,
            failure_count: failures.len() as u64,
            skipped_count: 0,
            duration_seconds: 10,
            failures: failures.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn set(profiles: Vec<TestProfile>) -> ProfileSet {
        profiles.into_iter().collect()
    }

    #[test]
    fn identical_runs_have_no_changes() {
        let a = set(vec![profile("xfs_crc", &["generic/001"])]);
        let diff = diff_profiles(&a, &a.clone(), false);
        assert!(!diff.has_changes());
        assert!(diff.profiles.is_empty());
        assert_eq!(diff.total_unchanged, 1);
    }

    #[test]
    fn regression_is_reported() {
        let base = set(vec![profile("xfs_crc", &[])]);
        let cand = set(vec![profile("xfs_crc", &["generic/475"])]);
        let diff = diff_profiles(&base, &cand, false);
        assert_eq!(diff.total_regressions, 1);
        let p = diff.profile("xfs_crc").unwrap();
        assert!(p.regressions.contains("generic/475"));
    }

    #[test]
    fn profile_missing_on_one_side_is_empty() {
        let base = set(vec![profile("xfs_crc", &["generic/001"])]);
        let cand = set(vec![profile("xfs_reflink", &["generic/002"])]);
        let diff = diff_profiles(&base, &cand, false);
        assert_eq!(diff.profiles_compared, 2);
        assert_eq!(diff.total_fixes, 1);
        assert_eq!(diff.total_regressions, 1);
    }

    #[test]
    fn duplicates_in_failure_list_count_once() {
        let base = set(vec![profile("xfs_crc", &[])]);
        let cand = set(vec![profile("xfs_crc", &["generic/001", "generic/001"])]);
        let diff = diff_profiles(&base, &cand, false);
        assert_eq!(diff.total_regressions, 1);
    }

    #[test]
    fn verbose_annotates_every_failing_test() {
        let base = set(vec![
            profile("a", &["t1", "t2", "t4"]),
            profile("b", &[]),
        ]);
        let cand = set(vec![profile("a", &["t1", "t3"]), profile("b", &["t2"])]);
        let diff = diff_profiles(&base, &cand, true);

        // both profiles ran tests, so both are reported
        assert_eq!(diff.profiles.len(), 2);
        let a = diff.profile("a").unwrap();
        let outcomes: Vec<(&str, TestOutcome)> = a
            .annotations
            .iter()
            .map(|n| (n.test.as_str(), n.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("t1", TestOutcome::Fail),
                ("t2", TestOutcome::Pass),
                ("t3", TestOutcome::Regression),
                ("t4", TestOutcome::Fix),
            ]
        );
    }

    #[test]
    fn verbose_skips_profiles_without_observed_tests() {
        let mut empty = profile("idle", &[]);
        empty.test_count = 0;
        let base = set(vec![empty.clone()]);
        let cand = set(vec![empty]);
        let diff = diff_profiles(&base, &cand, true);
        assert!(diff.profiles.is_empty());
        assert_eq!(diff.profiles_compared, 1);
    }
}
