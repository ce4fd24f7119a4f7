//! Sequential batch processing of report commits.
//!
//! One commit is fetched, classified, parsed, named, persisted and indexed
//! before the next one starts. The collision policy of [`crate::naming`]
//! depends on that ordering.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{Classification, ReportClassifier, SkipReason};
use crate::config::{ExclusionReason, KresultsConfig};
use crate::domain::{
    is_official_release, CommitRecord, KernelVersion, KindFields, ProfileSet, Result, TestKind,
    UNKNOWN_FILESYSTEM,
};
use crate::fields::ReportFields;
use crate::index::{aggregate, IndexEntry};
use crate::naming::{assign_identity, base_identity};
use crate::obs::{
    emit_artifact_named, emit_batch_finished, emit_commit_failed, emit_commit_processed,
    emit_commit_skipped, CommitSpan,
};
use crate::profile::parse_profiles;
use crate::selftests::parse_selftests;
use crate::source::{RawReport, RawReportSource};
use crate::store::{ArtifactRef, ArtifactStore};

/// What happened to one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Processed(ArtifactRef),
    NotRelevant(SkipReason),
    /// Relevant filesystem report kept out of the filesystem dashboards.
    Excluded(ExclusionReason),
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed(artifact) => write!(f, "processed as {artifact}"),
            Self::NotRelevant(reason) => write!(f, "skipped: {reason}"),
            Self::Excluded(reason) => write!(f, "excluded: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    /// Not relevant or excluded.
    pub skipped: usize,
    /// Retrieval or storage failed.
    pub failed: usize,
    pub artifacts: Vec<ArtifactRef>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

/// Turn a relevant report into its typed record.
pub fn build_record(
    report: &RawReport,
    fields: &ReportFields,
    kind: TestKind,
    classifier: &ReportClassifier,
) -> CommitRecord {
    let kernel = KernelVersion::parse(fields.kernel_or_unknown());
    let official_release = is_official_release(&report.subject, &kernel.base_version);

    let mut extra = KindFields {
        tree: fields.tree.clone(),
        git_ref: fields.git_ref.clone(),
        ..KindFields::default()
    };

    let (profiles, totals, filesystem) = match kind {
        TestKind::MemoryManagement => {
            let results = parse_selftests(&report.body);
            let totals = results.to_totals();
            extra.selftests = Some(results);
            (ProfileSet::new(), totals, None)
        }
        TestKind::Filesystem | TestKind::Integration => {
            let parsed = parse_profiles(&report.body);
            let first = parsed.profiles.names().next();
            let detected = classifier.detect_filesystem(&report.subject, &report.body, first);
            // only the filesystem family needs a directory name
            let fs = match (detected, kind) {
                (None, TestKind::Filesystem) => {
                    warn!(subject = %report.subject, "no known filesystem in report");
                    Some(UNKNOWN_FILESYSTEM.to_string())
                }
                (detected, _) => detected,
            };
            (parsed.profiles, parsed.totals, fs)
        }
    };

    if kind == TestKind::Integration {
        extra.test_result = fields.test_result.clone();
        extra.test_number = fields.test_number.clone();
    }

    CommitRecord {
        commit_id: report.commit_id.clone(),
        subject: report.subject.clone(),
        date: report.date.clone(),
        kernel,
        official_release,
        cpus: fields.cpus,
        test_kind: kind,
        filesystem,
        profiles,
        totals,
        extra,
    }
}

pub struct Pipeline<'a> {
    source: &'a dyn RawReportSource,
    store: &'a dyn ArtifactStore,
    classifier: ReportClassifier,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn RawReportSource,
        store: &'a dyn ArtifactStore,
        config: &KresultsConfig,
    ) -> Result<Self> {
        Ok(Self {
            source,
            store,
            classifier: ReportClassifier::new(config)?,
        })
    }

    pub fn classifier(&self) -> &ReportClassifier {
        &self.classifier
    }

    /// Fetch, classify and persist one commit. Nothing is written unless
    /// the commit is relevant and its text was retrieved.
    pub fn process_commit(&self, commit: &str) -> Result<ProcessOutcome> {
        let _span = CommitSpan::enter(commit);
        let report = self.source.fetch(commit)?;
        let fields = ReportFields::parse(&report.body);

        let kind = match self.classifier.classify(&report.subject, &fields) {
            Classification::Relevant(kind) => kind,
            Classification::NotRelevant(reason) => {
                emit_commit_skipped(&report.commit_id, &reason);
                return Ok(ProcessOutcome::NotRelevant(reason));
            }
        };

        if kind == TestKind::Filesystem {
            if let Some(reason) = self
                .classifier
                .fs_exclusion(&report.subject, fields.tree.as_deref())
            {
                emit_commit_skipped(&report.commit_id, &reason);
                return Ok(ProcessOutcome::Excluded(reason));
            }
        }

        let record = build_record(&report, &fields, kind, &self.classifier);
        debug!(kernel = %record.kernel, kind = %kind, profiles = record.profiles.len(), "record built");

        let artifact = assign_identity(self.store, &record)?;
        emit_artifact_named(
            &record.commit_id,
            artifact.family.dir_name(),
            &artifact.identity,
            artifact.identity != base_identity(&record),
        );

        self.store
            .write_record(&artifact.family, &artifact.identity, &record)?;
        let index = aggregate(
            self.store,
            &artifact.family,
            IndexEntry::from_record(&artifact.identity, &record),
        )?;
        self.store.write_index(&index)?;

        emit_commit_processed(
            &record.commit_id,
            &artifact.to_string(),
            record.totals.failure_count,
        );
        Ok(ProcessOutcome::Processed(artifact))
    }

    /// Process `start..end` (or just `end` without a start), newest first.
    /// A commit that fails is logged and counted; only failing to list the
    /// range aborts the batch.
    pub fn process_range(&self, start: Option<&str>, end: &str) -> Result<BatchSummary> {
        self.process_range_with(start, end, |_, _| {})
    }

    /// Like [`Pipeline::process_range`], calling `on_commit` after each
    /// commit.
    pub fn process_range_with<F>(
        &self,
        start: Option<&str>,
        end: &str,
        mut on_commit: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&str, &Result<ProcessOutcome>),
    {
        let commits = match start {
            Some(start) => self.source.list_range(start, end)?,
            None => vec![end.to_string()],
        };

        let mut summary = BatchSummary::default();
        for commit in &commits {
            let outcome = self.process_commit(commit);
            match &outcome {
                Ok(ProcessOutcome::Processed(artifact)) => {
                    summary.processed += 1;
                    summary.artifacts.push(artifact.clone());
                }
                Ok(_) => summary.skipped += 1,
                Err(e) => {
                    emit_commit_failed(commit, e);
                    summary.failed += 1;
                }
            }
            on_commit(commit, &outcome);
        }

        emit_batch_finished(summary.processed, summary.skipped, summary.failed);
        Ok(summary)
    }
}
