//! Artifact identities.
//!
//! Precedence:
//! 1. same-day sequence number: `<date>_test<N>`
//! 2. official release: `v<base>` (`6.15.0-rc2` → `v6.15-rc2`, `6.15.0` → `v6.15`)
//! 3. `next-` tree: the tag itself
//! 4. anything else: the raw kernel token
//!
//! When the identity is already owned by another commit, the new record is
//! suffixed with the first 8 characters of its commit id. The unsuffixed
//! name always stays with the first record that claimed it.

use tracing::warn;

use crate::domain::kernel::UNKNOWN_KERNEL;
use crate::domain::{CommitRecord, ReleaseKind, Result};
use crate::store::{ArtifactRef, ArtifactStore};

/// Length of the commit prefix used to disambiguate identities.
pub const SHORT_COMMIT_LEN: usize = 8;

pub fn short_commit(commit_id: &str) -> &str {
    match commit_id.char_indices().nth(SHORT_COMMIT_LEN) {
        Some((idx, _)) => &commit_id[..idx],
        None => commit_id,
    }
}

fn path_safe(identity: &str) -> String {
    let cleaned: String = identity
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        UNKNOWN_KERNEL.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Identity derived from the record alone, before collision handling.
pub fn base_identity(record: &CommitRecord) -> String {
    if let (Some(n), Some(day)) = (record.extra.test_number.as_deref(), record.day()) {
        return path_safe(&format!("{day}_test{n}"));
    }

    let kernel = &record.kernel;
    let base = kernel.base_version.as_str();
    let official = match kernel.release_kind {
        _ if !record.official_release => None,
        ReleaseKind::Stable => Some(format!("v{base}")),
        ReleaseKind::ReleaseCandidate => Some(format!("v{}", base.replace(".0-rc", "-rc"))),
        ReleaseKind::Vanilla => Some(format!("v{}", base.strip_suffix(".0").unwrap_or(base))),
        ReleaseKind::Next | ReleaseKind::Development => None,
    };

    let identity = match official {
        Some(identity) => identity,
        None if kernel.release_kind == ReleaseKind::Next => base.to_string(),
        None => kernel.raw.clone(),
    };
    path_safe(&identity)
}

/// Pick the identity `record` is stored under.
///
/// Re-processing a commit that already owns the base identity gets that
/// identity back instead of a suffixed duplicate. A stored record that
/// exists but cannot be read is treated as owned by another commit.
pub fn assign_identity(store: &dyn ArtifactStore, record: &CommitRecord) -> Result<ArtifactRef> {
    let family = record.family();
    let base = base_identity(record);
    let suffixed = || format!("{base}-{}", short_commit(&record.commit_id));

    let identity = match store.load_record(&family, &base) {
        Ok(Some(existing)) if existing.commit_id != record.commit_id => suffixed(),
        Ok(_) => base.clone(),
        Err(e) if store.exists(&family, &base)? => {
            warn!(family = %family, identity = %base, error = %e, "unreadable record owns identity");
            suffixed()
        }
        Err(e) => return Err(e),
    };

    Ok(ArtifactRef { family, identity })
}
