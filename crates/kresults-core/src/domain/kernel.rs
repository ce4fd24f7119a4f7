//! Kernel version tokens as reported by the test harness.
//!
//! A token such as `6.15.0-rc2-g57265e6ac675` is split into the release it
//! was built from (`6.15.0-rc2`) and the abbreviated git hash of the tree
//! (`57265e6ac675`), then classified into a [`ReleaseKind`].

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Literal used when a report carries no recognisable kernel version.
pub const UNKNOWN_KERNEL: &str = "Unknown";

/// Classification of a kernel version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
    Stable,
    Vanilla,
    #[serde(rename = "rc")]
    ReleaseCandidate,
    Next,
    Development,
}

impl ReleaseKind {
    /// Presentation order used by family indexes.
    pub const ALL: [ReleaseKind; 5] = [
        ReleaseKind::Stable,
        ReleaseKind::Vanilla,
        ReleaseKind::ReleaseCandidate,
        ReleaseKind::Next,
        ReleaseKind::Development,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Vanilla => "vanilla",
            Self::ReleaseCandidate => "rc",
            Self::Next => "next",
            Self::Development => "development",
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed kernel version. Immutable once derived from a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelVersion {
    /// Token exactly as it appeared in the report.
    pub raw: String,
    /// Release the tree is based on, without the `-g<hash>` suffix.
    pub base_version: String,
    /// Abbreviated git hash; empty when the token carried none.
    pub vcs_hash: String,
    pub release_kind: ReleaseKind,
}

impl KernelVersion {
    /// Parse a free-form version token. Never fails: tokens that match no
    /// known shape are kept verbatim as the base version.
    pub fn parse(token: &str) -> Self {
        let raw = token.trim();
        let (base_version, vcs_hash) = split_version(raw);
        let release_kind = release_kind_of(&base_version);
        Self {
            raw: raw.to_string(),
            base_version,
            vcs_hash,
            release_kind,
        }
    }

    pub fn unknown() -> Self {
        Self::parse(UNKNOWN_KERNEL)
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn tagged_release_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+\.\d+(?:\.\d+)?(?:-\w+\d+)?(?:-\w+\d+)?)-g([a-f0-9]+)$")
            .expect("tagged release regex")
    })
}

fn next_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(next-\d+)-g([a-f0-9]+)$").expect("next tag regex"))
}

fn official_subject_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Linux \d+\.\d+(?:\.\d+)?(?:-rc\d+)?").expect("official subject regex")
    })
}

fn numeric_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("numeric run regex"))
}

/// Split `token` into `(base_version, vcs_hash)`.
pub fn split_version(token: &str) -> (String, String) {
    for re in [tagged_release_regex(), next_tag_regex()] {
        if let Some(caps) = re.captures(token) {
            return (caps[1].to_string(), caps[2].to_string());
        }
    }
    (token.to_string(), String::new())
}

/// Classify a base version. `next-` and `-rc` markers win over the numeric
/// shape of the version.
pub fn release_kind_of(base_version: &str) -> ReleaseKind {
    if base_version.starts_with("next-") {
        return ReleaseKind::Next;
    }
    if base_version.contains("-rc") {
        return ReleaseKind::ReleaseCandidate;
    }

    let parts: Vec<&str> = numeric_run_regex()
        .find_iter(base_version)
        .map(|m| m.as_str())
        .collect();
    let is_zero = |digits: &str| digits.bytes().all(|b| b == b'0');

    match parts.as_slice() {
        [_, _, patch, ..] if !is_zero(*patch) => ReleaseKind::Stable,
        [_, _] => ReleaseKind::Vanilla,
        [_, _, _, ..] => ReleaseKind::Vanilla,
        _ => ReleaseKind::Development,
    }
}

/// Whether the commit subject announces an official, tagged release.
pub fn is_official_release(subject: &str, base_version: &str) -> bool {
    if subject.contains("Linux") && !base_version.is_empty() && subject.contains(base_version) {
        return true;
    }
    official_subject_regex().is_match(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_token_with_hash() {
        let v = KernelVersion::parse("6.15.0-rc2-g57265e6ac675");
        assert_eq!(v.base_version, "6.15.0-rc2");
        assert_eq!(v.vcs_hash, "57265e6ac675");
        assert_eq!(v.release_kind, ReleaseKind::ReleaseCandidate);
    }

    #[test]
    fn plain_token_with_hash() {
        let v = KernelVersion::parse("6.15.0-g57265e6ac675");
        assert_eq!(v.base_version, "6.15.0");
        assert_eq!(v.vcs_hash, "57265e6ac675");
        assert_eq!(v.release_kind, ReleaseKind::Vanilla);
    }

    #[test]
    fn next_token() {
        let v = KernelVersion::parse("next-20250321-g1234abcd");
        assert_eq!(v.base_version, "next-20250321");
        assert_eq!(v.vcs_hash, "1234abcd");
        assert_eq!(v.release_kind, ReleaseKind::Next);
    }

    #[test]
    fn opaque_token_is_kept_verbatim() {
        let v = KernelVersion::parse("my-dev-branch+");
        assert_eq!(v.raw, "my-dev-branch+");
        assert_eq!(v.base_version, "my-dev-branch+");
        assert!(v.vcs_hash.is_empty());
        assert_eq!(v.release_kind, ReleaseKind::Development);
    }

    #[test]
    fn unknown_is_development() {
        let v = KernelVersion::unknown();
        assert_eq!(v.raw, UNKNOWN_KERNEL);
        assert_eq!(v.release_kind, ReleaseKind::Development);
    }

    #[test]
    fn release_kind_shapes() {
        assert_eq!(release_kind_of("6.15.0"), ReleaseKind::Vanilla);
        assert_eq!(release_kind_of("6.15"), ReleaseKind::Vanilla);
        assert_eq!(release_kind_of("6.15.3"), ReleaseKind::Stable);
        assert_eq!(release_kind_of("6.15.0-rc1"), ReleaseKind::ReleaseCandidate);
        assert_eq!(release_kind_of("next-20250321"), ReleaseKind::Next);
        assert_eq!(release_kind_of("6"), ReleaseKind::Development);
    }

    #[test]
    fn markers_take_precedence_over_numeric_shape() {
        // three components with a nonzero patch, but the rc marker wins
        assert_eq!(release_kind_of("6.15.3-rc1"), ReleaseKind::ReleaseCandidate);
        assert_eq!(release_kind_of("next-6.15.3"), ReleaseKind::Next);
    }

    #[test]
    fn official_release_detection() {
        assert!(is_official_release("Linux 6.15-rc2", "6.15.0-rc2"));
        assert!(is_official_release("linux-xfs-kpd: Linux 6.15.0", "6.15.0"));
        assert!(!is_official_release("xfs: fix a leak", "6.15.0"));
        assert!(!is_official_release("Linux-next snapshot", ""));
    }

    #[test]
    fn release_kind_serializes_like_index_type() {
        let json = serde_json::to_string(&ReleaseKind::ReleaseCandidate).unwrap();
        assert_eq!(json, "\"rc\"");
        assert_eq!(ReleaseKind::Stable.to_string(), "stable");
    }
}
