//! kresults core library
//!
//! Ingests CI run reports embedded in commit messages of a kernel test
//! results repository and turns them into typed, comparable records.
//! Re-exports the components needed for programmatic access.

pub mod classify;
pub mod compare;
pub mod config;
pub mod diff;
pub mod domain;
pub mod fields;
pub mod index;
pub mod naming;
pub mod obs;
pub mod pipeline;
pub mod profile;
pub mod reporting;
pub mod selftests;
pub mod source;
pub mod store;
pub mod telemetry;

pub use classify::{Classification, ReportClassifier, SkipReason};

pub use compare::{compare_commits, compare_reports, ComparedRun, Comparison};

pub use config::{
    ClassifierConfig, ExclusionReason, FilesystemPattern, FsExclusionPolicy, KresultsConfig,
    OutputConfig, CONFIG_ENV,
};

pub use diff::{diff_profiles, diff_records, ProfileDiff, RunDiff, TestAnnotation, TestOutcome};

pub use domain::{
    is_official_release, release_kind_of, CommitRecord, KernelVersion, KindFields, KresultsError,
    ProfileSet, ReleaseKind, ReportFamily, Result, SelftestCount, SelftestResults, TestKind,
    TestProfile, Totals, UNKNOWN_FILESYSTEM,
};

pub use fields::ReportFields;

pub use index::{aggregate, IndexEntry, ReleaseGroup, ReleaseIndex};

pub use naming::{assign_identity, base_identity, short_commit};

pub use obs::{
    emit_artifact_named, emit_batch_finished, emit_commit_failed, emit_commit_processed,
    emit_commit_skipped, CommitSpan,
};

pub use pipeline::{build_record, BatchSummary, Pipeline, ProcessOutcome};

pub use profile::{parse_profiles, ParsedProfiles, ProfileScanner, ScanState};

pub use reporting::{render_batch_summary_text, render_comparison_text, NO_CHANGES, NO_PROFILES};

pub use selftests::parse_selftests;

pub use source::{GitReportSource, MemoryReportSource, RawReport, RawReportSource};

pub use store::{ArtifactRef, ArtifactStore, FsArtifactStore, MemoryArtifactStore};

pub use telemetry::init_tracing;

/// kresults version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
