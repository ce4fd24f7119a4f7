//! Report classification: relevance, test kind and filesystem.
//!
//! A report that is not relevant is a normal outcome, not an error. The
//! rules are evaluated on the commit subject first and the declared
//! `workflow:` second:
//!
//! 1. integration prefix + verification marker: harness self-test, dropped
//! 2. integration prefix: kept as `Integration` if the workflow is fstests
//! 3. memory-management marker: kept as `MemoryManagement` if selftests
//! 4. anything else: kept as `Filesystem` if the workflow is fstests

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::config::{ClassifierConfig, ExclusionReason, FsExclusionPolicy, KresultsConfig};
use crate::domain::{KresultsError, Result, TestKind};
use crate::fields::ReportFields;

/// Why a report was filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Harness self-verification commit.
    VerificationRun,
    /// Body carries no `workflow:` field.
    MissingWorkflow,
    /// Declared workflow does not match the one the kind requires.
    WorkflowMismatch { kind: TestKind, workflow: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerificationRun => write!(f, "CI verification commit"),
            Self::MissingWorkflow => write!(f, "no workflow field"),
            Self::WorkflowMismatch { kind, workflow } => {
                write!(f, "workflow {workflow:?} is not a {kind} workflow")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Relevant(TestKind),
    NotRelevant(SkipReason),
}

impl Classification {
    pub fn kind(&self) -> Option<TestKind> {
        match self {
            Self::Relevant(kind) => Some(*kind),
            Self::NotRelevant(_) => None,
        }
    }
}

struct CompiledFilesystem {
    name: String,
    patterns: Vec<Regex>,
}

impl CompiledFilesystem {
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

pub struct ReportClassifier {
    markers: ClassifierConfig,
    filesystems: Vec<CompiledFilesystem>,
    exclusion: FsExclusionPolicy,
}

impl ReportClassifier {
    pub fn new(config: &KresultsConfig) -> Result<Self> {
        let filesystems = config
            .filesystems
            .iter()
            .map(|fs| {
                let patterns = fs
                    .patterns
                    .iter()
                    .map(|p| {
                        RegexBuilder::new(p)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| {
                                KresultsError::Config(format!("bad pattern for {}: {e}", fs.name))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledFilesystem {
                    name: fs.name.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            markers: config.classifier.clone(),
            filesystems,
            exclusion: config.fs_exclusion.clone(),
        })
    }

    /// Decide whether a report is relevant and which kind it is.
    pub fn classify(&self, subject: &str, fields: &ReportFields) -> Classification {
        let m = &self.markers;
        let integration = subject.starts_with(&m.integration_prefix);

        if integration && subject.contains(&m.verification_marker) {
            return Classification::NotRelevant(SkipReason::VerificationRun);
        }

        let (kind, required) = if integration {
            (TestKind::Integration, &m.fstests_workflow)
        } else if subject.contains(&m.mm_marker) {
            (TestKind::MemoryManagement, &m.selftests_workflow)
        } else {
            (TestKind::Filesystem, &m.fstests_workflow)
        };

        match fields.workflow.as_deref() {
            None => Classification::NotRelevant(SkipReason::MissingWorkflow),
            Some(_) if fields.workflow_contains(required) => Classification::Relevant(kind),
            Some(workflow) => Classification::NotRelevant(SkipReason::WorkflowMismatch {
                kind,
                workflow: workflow.to_string(),
            }),
        }
    }

    /// Identify the exercised filesystem: subject, then body, then the
    /// first profile name. First match wins.
    pub fn detect_filesystem(
        &self,
        subject: &str,
        body: &str,
        first_profile: Option<&str>,
    ) -> Option<String> {
        let by_text = |text: &str| {
            self.filesystems
                .iter()
                .find(|fs| fs.matches(text))
                .map(|fs| fs.name.clone())
        };

        by_text(subject).or_else(|| by_text(body)).or_else(|| {
            let profile = first_profile?.to_lowercase();
            self.filesystems
                .iter()
                .find(|fs| profile.contains(&fs.name.to_lowercase()))
                .map(|fs| fs.name.clone())
        })
    }

    /// Whether a filesystem report should stay out of per-filesystem
    /// processing.
    pub fn fs_exclusion(&self, subject: &str, tree: Option<&str>) -> Option<ExclusionReason> {
        self.exclusion.check(tree, subject)
    }
}
