//! Structured lifecycle events for commit processing.
//!
//! This module provides:
//! - Commit-scoped tracing spans via the `CommitSpan` RAII guard
//! - Emission functions for the batch lifecycle: skipped, processed,
//!   failed, artifact named, batch finished
//!
//! Events are emitted at `info!` level (failures at `warn!`) with an
//! `event` field naming them; filter with `KRESULTS_LOG`.

use tracing::{info, warn};

use crate::naming::short_commit;

/// RAII guard that enters a commit-scoped span while one commit is
/// processed.
///
/// # Example
///
/// ```ignore
/// let _span = CommitSpan::enter("57265e6ac675...");
/// // every log line now carries commit=57265e6a
/// ```
pub struct CommitSpan {
    _span: tracing::span::EnteredSpan,
}

impl CommitSpan {
    pub fn enter(commit_id: &str) -> Self {
        let span = tracing::info_span!("kresults.commit", commit = %short_commit(commit_id));
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: commit filtered out (not relevant or excluded).
pub fn emit_commit_skipped(commit_id: &str, reason: &dyn std::fmt::Display) {
    info!(event = "commit.skipped", commit = %commit_id, reason = %reason);
}

/// Emit event: record persisted and family index rebuilt.
pub fn emit_commit_processed(commit_id: &str, artifact: &str, failures: u64) {
    info!(
        event = "commit.processed",
        commit = %commit_id,
        artifact = %artifact,
        failures = failures,
    );
}

/// Emit event: commit could not be processed (warn level).
pub fn emit_commit_failed(commit_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "commit.failed", commit = %commit_id, error = %error);
}

/// Emit event: identity chosen for a record.
pub fn emit_artifact_named(commit_id: &str, family: &str, identity: &str, suffixed: bool) {
    info!(
        event = "artifact.named",
        commit = %commit_id,
        family = %family,
        identity = %identity,
        suffixed = suffixed,
    );
}

/// Emit event: batch completed.
pub fn emit_batch_finished(processed: usize, skipped: usize, failed: usize) {
    info!(
        event = "batch.finished",
        processed = processed,
        skipped = skipped,
        failed = failed,
    );
}
