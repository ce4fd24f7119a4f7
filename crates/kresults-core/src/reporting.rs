use std::fmt::Write as _;

use crate::compare::{ComparedRun, Comparison};
use crate::diff::ProfileDiff;
use crate::pipeline::BatchSummary;

pub const NO_CHANGES: &str = "No changes in test results between the commits";
pub const NO_PROFILES: &str = "No test profiles found in the commits";

const LABEL_WIDTH: usize = 15;
const RULE_WIDTH: usize = 80;
const SHORT_ID_LEN: usize = 12;

fn short_id(commit_id: &str) -> &str {
    match commit_id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &commit_id[..idx],
        None => commit_id,
    }
}

fn push_run_line(out: &mut String, label: &str, run: &ComparedRun) {
    let _ = writeln!(
        out,
        "{label:<LABEL_WIDTH$}{} | {}",
        short_id(&run.commit_id),
        run.subject
    );
}

fn push_profile(out: &mut String, profile: &ProfileDiff, verbose: bool) {
    let _ = writeln!(out, "\nProfile: {}", profile.profile);

    if verbose {
        for note in &profile.annotations {
            let _ = writeln!(
                out,
                "    {} {} ({})",
                note.outcome.marker(),
                note.test,
                note.outcome.as_str()
            );
        }
        return;
    }

    if !profile.regressions.is_empty() {
        out.push_str("  New Failures:\n");
        for test in &profile.regressions {
            let _ = writeln!(out, "    + {test}");
        }
    }
    if !profile.fixes.is_empty() {
        out.push_str("  Resolved Failures:\n");
        for test in &profile.fixes {
            let _ = writeln!(out, "    - {test}");
        }
    }
}

/// Human-readable comparison for standard output.
pub fn render_comparison_text(cmp: &Comparison) -> String {
    let mut out = String::new();
    out.push_str("Comparing commits:\n");
    push_run_line(&mut out, "Baseline:", &cmp.baseline);
    push_run_line(&mut out, "Test:", &cmp.candidate);
    out.push('\n');
    let _ = writeln!(out, "{:<LABEL_WIDTH$}{}", "Baseline Kernel:", cmp.baseline.kernel);
    let _ = writeln!(out, "{:<LABEL_WIDTH$}{}", "Test Kernel:", cmp.candidate.kernel);
    out.push('\n');

    let diff = &cmp.diff;
    if diff.profiles_compared == 0 {
        out.push_str(NO_PROFILES);
        out.push('\n');
        return out;
    }

    out.push_str("Test Results Comparison:\n");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');

    for profile in &diff.profiles {
        push_profile(&mut out, profile, cmp.verbose);
    }

    if !diff.has_changes() {
        let _ = writeln!(out, "\n{NO_CHANGES}");
    }

    let _ = writeln!(
        out,
        "\nSummary: {} regressions, {} fixes, {} unchanged",
        diff.total_regressions, diff.total_fixes, diff.total_unchanged
    );
    out
}

pub fn render_batch_summary_text(summary: &BatchSummary) -> String {
    format!(
        "Processed {} commit(s), skipped {}, failed {}",
        summary.processed, summary.skipped, summary.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_reports;
    use crate::source::RawReport;

    fn raw(id: &str, body: &str) -> RawReport {
        RawReport {
            commit_id: id.to_string(),
            subject: format!("run {id}"),
            date: "2025-03-21 10:00:00 +0000".to_string(),
            body: body.to_string(),
        }
    }

    const BASE: &str = "\
KERNEL: 6.15.0-rc1-gaaaaaaaaaaaa
xfs_crc: 10 tests, 1 failures, 0 skipped, 10 seconds
  Failures: generic/001
";

    const CAND: &str = "\
KERNEL: 6.15.0-rc2-gbbbbbbbbbbbb
xfs_crc: 10 tests, 1 failures, 0 skipped, 10 seconds
  Failures: generic/002
";

    #[test]
    fn header_lines_are_aligned() {
        let cmp = compare_reports(
            &raw("0123456789abcdef0123", BASE),
            &raw("fedcba9876543210fedc", CAND),
            false,
        );
        let text = render_comparison_text(&cmp);
        assert!(text.contains("Baseline:      0123456789ab | run 0123456789abcdef0123"));
        assert!(text.contains("Test:          fedcba987654 |"));
        assert!(text.contains("Baseline Kernel:6.15.0-rc1-gaaaaaaaaaaaa"));
        assert!(text.contains("Test Kernel:   6.15.0-rc2-gbbbbbbbbbbbb"));
    }

    #[test]
    fn changes_are_listed() {
        let cmp = compare_reports(&raw("a", BASE), &raw("b", CAND), false);
        let text = render_comparison_text(&cmp);
        assert!(text.contains("Profile: xfs_crc"));
        assert!(text.contains("  New Failures:\n    + generic/002"));
        assert!(text.contains("  Resolved Failures:\n    - generic/001"));
        assert!(!text.contains(NO_CHANGES));
        assert!(text.contains("Summary: 1 regressions, 1 fixes, 0 unchanged"));
    }

    #[test]
    fn identical_runs_say_no_changes() {
        let cmp = compare_reports(&raw("a", BASE), &raw("b", BASE), false);
        let text = render_comparison_text(&cmp);
        assert!(text.contains(NO_CHANGES));
        assert!(!text.contains("Profile:"));
    }

    #[test]
    fn no_profiles_message() {
        let cmp = compare_reports(&raw("a", "nothing"), &raw("b", "nothing"), false);
        let text = render_comparison_text(&cmp);
        assert!(text.contains(NO_PROFILES));
        assert!(text.contains("Baseline Kernel:Unknown"));
        assert!(!text.contains("Test Results Comparison"));
    }

    #[test]
    fn verbose_lists_annotated_tests() {
        let cmp = compare_reports(&raw("a", BASE), &raw("b", BASE), true);
        let text = render_comparison_text(&cmp);
        assert!(text.contains("Profile: xfs_crc"));
        assert!(text.contains("    ! generic/001 (fail)"));
        assert!(text.contains(NO_CHANGES));
    }

    #[test]
    fn stable_render() {
        let cmp = compare_reports(&raw("a", BASE), &raw("b", CAND), true);
        assert_eq!(render_comparison_text(&cmp), render_comparison_text(&cmp));
    }
}
