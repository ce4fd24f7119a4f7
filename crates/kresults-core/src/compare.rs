//! Side-by-side comparison of two report commits.
//!
//! Unlike the dashboard pipeline this does not require either report to be
//! classified as relevant: kernel and profiles are read straight from the
//! text.

use serde::{Deserialize, Serialize};

use crate::diff::{diff_profiles, RunDiff};
use crate::domain::Result;
use crate::fields::ReportFields;
use crate::profile::parse_profiles;
use crate::source::{RawReport, RawReportSource};

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedRun {
    pub commit_id: String,
    pub subject: String,
    pub kernel: String,
}

impl ComparedRun {
    fn from_report(report: &RawReport) -> Self {
        Self {
            commit_id: report.commit_id.clone(),
            subject: report.subject.clone(),
            kernel: ReportFields::parse(&report.body)
                .kernel_or_unknown()
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: ComparedRun,
    pub candidate: ComparedRun,
    pub verbose: bool,
    pub diff: RunDiff,
}

pub fn compare_reports(baseline: &RawReport, candidate: &RawReport, verbose: bool) -> Comparison {
    let base_profiles = parse_profiles(&baseline.body).profiles;
    let cand_profiles = parse_profiles(&candidate.body).profiles;
    Comparison {
        baseline: ComparedRun::from_report(baseline),
        candidate: ComparedRun::from_report(candidate),
        verbose,
        diff: diff_profiles(&base_profiles, &cand_profiles, verbose),
    }
}

/// Fetch both commits and compare them. Fails if either cannot be
/// retrieved.
pub fn compare_commits(
    source: &dyn RawReportSource,
    baseline: &str,
    candidate: &str,
    verbose: bool,
) -> Result<Comparison> {
    let base = source.fetch(baseline)?;
    let cand = source.fetch(candidate)?;
    Ok(compare_reports(&base, &cand, verbose))
}
