//! kresults - kernel CI report ingestion CLI
//!
//! Reads CI run reports stored as commit messages in a results repository.
//!
//! ## Commands
//!
//! - `compare`: regressions and fixes between two report commits
//! - `dashboard`: persist records and per-family indexes for a commit or range

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use kresults_core::{
    compare_commits, render_batch_summary_text, render_comparison_text, BatchSummary,
    FsArtifactStore, GitReportSource, KresultsConfig, Pipeline, ProcessOutcome,
};

#[derive(Parser)]
#[command(name = "kresults")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kernel CI report ingestion and differencing", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Working copy of the results repository
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "KRESULTS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the results of two commits
    Compare {
        /// Baseline commit
        baseline: String,

        /// Commit to compare against the baseline
        candidate: String,

        /// Annotate every failing test, not only changes
        #[arg(long)]
        verbose_diff: bool,

        /// Print the diff as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Persist records and indexes for a commit or a range of commits
    Dashboard {
        /// Commit to process, or the end of the range
        #[arg(default_value = "HEAD")]
        commit: String,

        /// Process every commit after this one up to COMMIT
        #[arg(short, long)]
        start_commit: Option<String>,

        /// Output directory (default: from configuration)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    kresults_core::init_tracing(cli.log_json, level);

    let config =
        KresultsConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Compare {
            baseline,
            candidate,
            verbose_diff,
            json,
        } => cmd_compare(&cli.repo, &baseline, &candidate, verbose_diff, json),
        Commands::Dashboard {
            commit,
            start_commit,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.default_dir.clone());
            let summary = cmd_dashboard(
                &cli.repo,
                &config,
                &commit,
                start_commit.as_deref(),
                &output_dir,
            )?;
            if start_commit.is_none() && summary.failed > 0 {
                bail!("Failed to process commit {commit}");
            }
            Ok(())
        }
    }
}

fn cmd_compare(
    repo: &Path,
    baseline: &str,
    candidate: &str,
    verbose: bool,
    json: bool,
) -> Result<()> {
    let source = GitReportSource::new(repo);
    let comparison = compare_commits(&source, baseline, candidate, verbose)
        .with_context(|| format!("Failed to compare {baseline} against {candidate}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison.diff)?);
    } else {
        print!("{}", render_comparison_text(&comparison));
    }
    Ok(())
}

fn cmd_dashboard(
    repo: &Path,
    config: &KresultsConfig,
    commit: &str,
    start: Option<&str>,
    output_dir: &Path,
) -> Result<BatchSummary> {
    let source = GitReportSource::new(repo);
    let store = FsArtifactStore::new(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    let pipeline = Pipeline::new(&source, &store, config).context("Invalid configuration")?;

    info!(output = %output_dir.display(), "processing reports");
    let summary = pipeline
        .process_range_with(start, commit, |id, outcome| {
            println!("{}", render_progress_line(id, outcome));
        })
        .context("Failed to list commits")?;

    println!("{}", render_batch_summary_text(&summary));
    Ok(summary)
}

fn render_progress_line(commit: &str, outcome: &kresults_core::Result<ProcessOutcome>) -> String {
    let short = kresults_core::short_commit(commit);
    match outcome {
        Ok(outcome) => format!("{short}: {outcome}"),
        Err(e) => format!("{short}: failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::process::Command as StdCommand;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compare_args_parse() {
        let cli = Cli::try_parse_from([
            "kresults",
            "compare",
            "abc",
            "def",
            "--verbose-diff",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare {
                baseline,
                candidate,
                verbose_diff,
                json,
            } => {
                assert_eq!(baseline, "abc");
                assert_eq!(candidate, "def");
                assert!(verbose_diff);
                assert!(json);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn dashboard_defaults_to_head() {
        let cli = Cli::try_parse_from(["kresults", "dashboard", "-s", "abc"]).unwrap();
        match cli.command {
            Commands::Dashboard {
                commit,
                start_commit,
                output_dir,
            } => {
                assert_eq!(commit, "HEAD");
                assert_eq!(start_commit.as_deref(), Some("abc"));
                assert!(output_dir.is_none());
            }
            _ => panic!("expected dashboard"),
        }
    }

    fn run_git(repo_dir: &Path, args: &[&str]) {
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
    }

    fn make_results_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-q", "-m", "initial"]);
        run_git(
            dir.path(),
            &[
                "commit",
                "--allow-empty",
                "-q",
                "-m",
                "linux-xfs-kpd: xfs: fix a leak\n\nworkflow: fstests\n\
KERNEL: 6.15.0-rc2-g57265e6ac675\n\n\
xfs_crc: 10 tests, 1 failures, 0 skipped, 10 seconds\n  Failures: generic/475\n",
            ],
        );
        dir
    }

    #[test]
    fn dashboard_processes_range() {
        let repo = make_results_repo();
        let out = tempfile::tempdir().unwrap();
        let summary = cmd_dashboard(
            repo.path(),
            &KresultsConfig::default(),
            "HEAD",
            Some("HEAD~1"),
            out.path(),
        )
        .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 0);
        assert!(out.path().join("xfs").join("index.json").is_file());
    }

    #[test]
    fn compare_unknown_commit_fails() {
        let repo = make_results_repo();
        let result = cmd_compare(repo.path(), "HEAD", "no-such-commit", false, false);
        assert!(result.is_err());
    }

    #[test]
    fn progress_line_names_outcome() {
        let err: kresults_core::Result<ProcessOutcome> =
            Err(kresults_core::KresultsError::retrieval("deadbeef", "gone"));
        let line = render_progress_line("deadbeefcafebabe", &err);
        assert!(line.starts_with("deadbeef: failed"));
    }
}
