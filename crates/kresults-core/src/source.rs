//! Where report text comes from.
//!
//! [`GitReportSource`] shells out to `git` in a working copy of the results
//! repository. [`MemoryReportSource`] serves canned reports.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::{KresultsError, Result};

/// Commit text as retrieved, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    /// Full commit id.
    pub commit_id: String,
    pub subject: String,
    /// Author date in `%ai` form.
    pub date: String,
    /// Whole commit message, subject included.
    pub body: String,
}

pub trait RawReportSource {
    /// Retrieve one commit. A failure here aborts that commit only.
    fn fetch(&self, commit: &str) -> Result<RawReport>;

    /// Commits in `start..end`, newest first.
    fn list_range(&self, start: &str, end: &str) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

const FIELD_SEP: char = '\u{0}';

pub struct GitReportSource {
    repo_dir: PathBuf,
}

impl GitReportSource {
    pub fn new(repo_dir: impl AsRef<Path>) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn git(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| KresultsError::GitError(format!("failed to run git: {e}")))
    }
}

impl RawReportSource for GitReportSource {
    fn fetch(&self, commit: &str) -> Result<RawReport> {
        let output = self.git(&[
            "show",
            "--no-patch",
            "--format=%H%x00%ai%x00%s%x00%B",
            commit,
            "--",
        ])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KresultsError::retrieval(commit, stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let mut fields = text.splitn(4, FIELD_SEP);
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(date), Some(subject), Some(body)) if !id.trim().is_empty() => {
                Ok(RawReport {
                    commit_id: id.trim().to_string(),
                    subject: subject.trim().to_string(),
                    date: date.trim().to_string(),
                    body: body.to_string(),
                })
            }
            _ => Err(KresultsError::retrieval(commit, "unexpected git show output")),
        }
    }

    fn list_range(&self, start: &str, end: &str) -> Result<Vec<String>> {
        let range = format!("{start}..{end}");
        let output = self.git(&["log", "--pretty=format:%H", &range, "--"])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KresultsError::GitError(format!(
                "git log {range} failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Canned reports, kept in commit order (oldest first).
#[derive(Debug, Default)]
pub struct MemoryReportSource {
    reports: Vec<RawReport>,
}

impl MemoryReportSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit on top of the history.
    pub fn push(&mut self, report: RawReport) {
        self.reports.push(report);
    }

    pub fn with(mut self, report: RawReport) -> Self {
        self.push(report);
        self
    }

    fn position(&self, commit: &str) -> Option<usize> {
        self.reports.iter().position(|r| r.commit_id == commit)
    }
}

impl RawReportSource for MemoryReportSource {
    fn fetch(&self, commit: &str) -> Result<RawReport> {
        self.position(commit)
            .map(|idx| self.reports[idx].clone())
            .ok_or_else(|| KresultsError::retrieval(commit, "unknown commit"))
    }

    fn list_range(&self, start: &str, end: &str) -> Result<Vec<String>> {
        let unknown = |c: &str| KresultsError::GitError(format!("unknown revision {c}"));
        let from = self.position(start).ok_or_else(|| unknown(start))?;
        let to = self.position(end).ok_or_else(|| unknown(end))?;
        if to <= from {
            return Ok(Vec::new());
        }
        Ok(self.reports[from + 1..=to]
            .iter()
            .rev()
            .map(|r| r.commit_id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn commit(repo_dir: &Path, message: &str) -> String {
        run_git(repo_dir, &["commit", "--allow-empty", "-q", "-m", message]);
        run_git(repo_dir, &["rev-parse", "HEAD"])
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        dir
    }

    #[test]
    fn fetch_returns_subject_date_and_body() {
        let repo = make_git_repo();
        let id = commit(
            repo.path(),
            "linux-xfs-kpd: xfs: fix\n\nworkflow: fstests\nKERNEL: 6.15.0-rc2-g57265e6ac675",
        );

        let source = GitReportSource::new(repo.path());
        let report = source.fetch("HEAD").unwrap();
        assert_eq!(report.commit_id, id);
        assert_eq!(report.subject, "linux-xfs-kpd: xfs: fix");
        assert!(report.body.contains("workflow: fstests"));
        assert!(crate::index::parse_git_date(&report.date).is_some());
    }

    #[test]
    fn fetch_unknown_commit_is_retrieval_error() {
        let repo = make_git_repo();
        commit(repo.path(), "initial");
        let err = GitReportSource::new(repo.path())
            .fetch("0000000000000000000000000000000000000000")
            .unwrap_err();
        assert!(err.is_retrieval());
    }

    #[test]
    fn list_range_is_newest_first_and_excludes_start() {
        let repo = make_git_repo();
        let a = commit(repo.path(), "a");
        let b = commit(repo.path(), "b");
        let c = commit(repo.path(), "c");

        let source = GitReportSource::new(repo.path());
        assert_eq!(source.list_range(&a, &c).unwrap(), vec![c, b]);
    }

    #[test]
    fn list_range_outside_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitReportSource::new(dir.path())
            .list_range("a", "b")
            .unwrap_err();
        assert!(matches!(err, KresultsError::GitError(_)));
    }

    fn raw(id: &str) -> RawReport {
        RawReport {
            commit_id: id.to_string(),
            subject: format!("subject {id}"),
            date: "2025-03-21 10:00:00 +0000".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn memory_source_range_matches_git_semantics() {
        let source = MemoryReportSource::new()
            .with(raw("a"))
            .with(raw("b"))
            .with(raw("c"));
        assert_eq!(source.list_range("a", "c").unwrap(), vec!["c", "b"]);
        assert!(source.list_range("c", "a").unwrap().is_empty());
        assert!(source.list_range("zz", "c").is_err());
        assert!(source.fetch("zz").unwrap_err().is_retrieval());
    }
}
