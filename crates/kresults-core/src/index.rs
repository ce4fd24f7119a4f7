//! Per-family index of persisted records, grouped by release kind.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{CommitRecord, ReleaseKind, ReportFamily, Result};
use crate::store::ArtifactStore;

/// Format of `git log --format=%ai`.
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

pub fn parse_git_date(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(date.trim(), GIT_DATE_FORMAT).ok()
}

/// Summary of one record as shown in a family index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub identity: String,
    pub commit_id: String,
    pub release_kind: ReleaseKind,
    pub date: String,
    pub failure_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_number: Option<String>,
}

impl IndexEntry {
    pub fn from_record(identity: &str, record: &CommitRecord) -> Self {
        Self {
            identity: identity.to_string(),
            commit_id: record.commit_id.clone(),
            release_kind: record.kernel.release_kind,
            date: record.date.clone(),
            failure_count: record.totals.failure_count,
            test_result: record.extra.test_result.clone(),
            test_number: record.extra.test_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseGroup {
    pub kind: ReleaseKind,
    /// Newest first.
    pub entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseIndex {
    pub family: ReportFamily,
    /// In [`ReleaseKind::ALL`] order; empty groups are left out.
    pub groups: Vec<ReleaseGroup>,
}

/// Newest first; entries whose date does not parse go last.
fn by_date_desc(a: &IndexEntry, b: &IndexEntry) -> Ordering {
    match (parse_git_date(&a.date), parse_git_date(&b.date)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl ReleaseIndex {
    /// Group and order `entries`. Ties keep the order of `entries`.
    pub fn build(family: ReportFamily, entries: Vec<IndexEntry>) -> Self {
        let groups = ReleaseKind::ALL
            .iter()
            .filter_map(|kind| {
                let mut group: Vec<IndexEntry> = entries
                    .iter()
                    .filter(|e| e.release_kind == *kind)
                    .cloned()
                    .collect();
                if group.is_empty() {
                    return None;
                }
                group.sort_by(by_date_desc);
                Some(ReleaseGroup {
                    kind: *kind,
                    entries: group,
                })
            })
            .collect();
        Self { family, groups }
    }

    pub fn group(&self, kind: ReleaseKind) -> Option<&ReleaseGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Merge `new_entry` with the summaries of every record already stored in
/// `family`. A stored record with the same identity is replaced by the new
/// entry; unreadable records are skipped with a warning.
pub fn aggregate(
    store: &dyn ArtifactStore,
    family: &ReportFamily,
    new_entry: IndexEntry,
) -> Result<ReleaseIndex> {
    let mut entries = Vec::new();
    for identity in store.list_identities(family)? {
        if identity == new_entry.identity {
            continue;
        }
        match store.load_record(family, &identity) {
            Ok(Some(record)) => entries.push(IndexEntry::from_record(&identity, &record)),
            Ok(None) => {}
            Err(e) => warn!(family = %family, identity = %identity, error = %e, "skipping unreadable record"),
        }
    }
    entries.push(new_entry);
    Ok(ReleaseIndex::build(family.clone(), entries))
}
