//! Test-profile sections of an fstests report.
//!
//! A section looks like:
//!
//! ```text
//! xfs_reflink_4k: 812 tests, 2 failures, 104 skipped, 5832 seconds
//!   Failures: generic/475 generic/648
//!     xfs/538
//! ```
//!
//! The body is scanned line by line by [`ProfileScanner`]. The failures
//! block ends at a blank line, a `Totals:` line, the next header-like line or
//! the end of the text, whichever comes first.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{ProfileSet, TestProfile, Totals};

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z0-9]+(?:_[A-Za-z0-9]+)*): (\d+) tests, (\d+) failures, (\d+) skipped, (\d+) seconds",
        )
        .expect("profile header regex")
    })
}

/// Column-zero `name: ` line. Closes a failures block even when it is not a
/// full profile header.
fn header_like_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+(?:_[A-Za-z0-9]+)*: ").expect("header-like regex"))
}

fn totals_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Totals: (\d+) tests, (\d+) skipped, (\d+) failures, (\d+) errors, (\d+)s")
            .expect("totals regex")
    })
}

fn number(caps: &regex::Captures<'_>, idx: usize) -> u64 {
    caps[idx].parse().unwrap_or_default()
}

fn parse_header(line: &str) -> Option<TestProfile> {
    let caps = header_regex().captures(line)?;
    Some(TestProfile {
        name: caps[1].to_string(),
        test_count: number(&caps, 2),
        failure_count: number(&caps, 3),
        skipped_count: number(&caps, 4),
        duration_seconds: number(&caps, 5),
        failures: Vec::new(),
    })
}

fn is_totals_line(line: &str) -> bool {
    line.trim_start().starts_with("Totals:")
}

fn failures_opener(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("Failures:")
}

fn push_tokens(profile: &mut TestProfile, text: &str) {
    profile
        .failures
        .extend(text.split_whitespace().map(str::to_string));
}

/// Position of the scanner within the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the next header, or for the `Failures:` line of a header
    /// already seen.
    SeekingProfileHeader,
    /// Collecting failure tokens of the current profile.
    InFailuresBlock,
    /// Input exhausted.
    Done,
}

/// Line-oriented scanner over a report body.
#[derive(Debug)]
pub struct ProfileScanner {
    state: ScanState,
    current: Option<TestProfile>,
    profiles: ProfileSet,
}

impl Default for ProfileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::SeekingProfileHeader,
            current: None,
            profiles: ProfileSet::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Name of the profile whose header was seen last and is still open.
    pub fn current_profile(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.name.as_str())
    }

    pub fn feed(&mut self, line: &str) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match self.state {
            ScanState::Done => {}
            ScanState::SeekingProfileHeader => self.seek(line),
            ScanState::InFailuresBlock => self.collect(line),
        }
    }

    fn seek(&mut self, line: &str) {
        if let Some(profile) = parse_header(line) {
            self.close();
            self.current = Some(profile);
        } else if is_totals_line(line) {
            self.close();
        } else if let (Some(profile), Some(rest)) = (self.current.as_mut(), failures_opener(line)) {
            push_tokens(profile, rest);
            self.state = ScanState::InFailuresBlock;
        }
    }

    fn collect(&mut self, line: &str) {
        if line.trim().is_empty() || is_totals_line(line) {
            self.close();
        } else if let Some(profile) = parse_header(line) {
            self.close();
            self.current = Some(profile);
        } else if header_like_regex().is_match(line) {
            self.close();
        } else if let Some(profile) = self.current.as_mut() {
            push_tokens(profile, line);
            return;
        }
        self.state = ScanState::SeekingProfileHeader;
    }

    fn close(&mut self) {
        if let Some(profile) = self.current.take() {
            if profile.has_count_mismatch() {
                warn!(
                    profile = %profile.name,
                    declared = profile.failure_count,
                    listed = profile.failures.len(),
                    "declared failure count disagrees with failure list"
                );
            }
            self.profiles.insert(profile);
        }
    }

    /// Close any open profile and hand back everything collected.
    pub fn finish(mut self) -> ProfileSet {
        self.close();
        self.state = ScanState::Done;
        self.profiles
    }
}

/// Profiles and totals of one report body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedProfiles {
    pub profiles: ProfileSet,
    pub totals: Totals,
    /// Totals came from a `Totals:` line rather than being summed.
    pub totals_declared: bool,
}

/// The `Totals:` line of a report, if any.
pub fn declared_totals(body: &str) -> Option<Totals> {
    let caps = totals_regex().captures(body)?;
    Some(Totals {
        test_count: number(&caps, 1),
        skipped_count: number(&caps, 2),
        failure_count: number(&caps, 3),
        error_count: number(&caps, 4),
        duration_seconds: number(&caps, 5),
    })
}

pub fn parse_profiles(body: &str) -> ParsedProfiles {
    let mut scanner = ProfileScanner::new();
    for line in body.lines() {
        scanner.feed(line);
    }
    let profiles = scanner.finish();

    match declared_totals(body) {
        Some(totals) => ParsedProfiles {
            profiles,
            totals,
            totals_declared: true,
        },
        None => ParsedProfiles {
            totals: Totals::sum_of(&profiles),
            profiles,
            totals_declared: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(lines: &[&str]) -> ProfileScanner {
        let mut s = ProfileScanner::new();
        for line in lines {
            s.feed(line);
        }
        s
    }

    #[test]
    fn header_alone_stays_seeking() {
        let s = scan(&["xfs_crc: 10 tests, 0 failures, 1 skipped, 100 seconds"]);
        assert_eq!(s.state(), ScanState::SeekingProfileHeader);
        assert_eq!(s.current_profile(), Some("xfs_crc"));
    }

    #[test]
    fn failures_line_enters_block() {
        let s = scan(&[
            "xfs_crc: 10 tests, 1 failures, 1 skipped, 100 seconds",
            "  Failures: generic/001",
        ]);
        assert_eq!(s.state(), ScanState::InFailuresBlock);
    }

    #[test]
    fn blank_line_closes_block() {
        let s = scan(&[
            "xfs_crc: 10 tests, 1 failures, 1 skipped, 100 seconds",
            "  Failures: generic/001",
            "",
            "  generic/999",
        ]);
        assert_eq!(s.state(), ScanState::SeekingProfileHeader);
        let set = s.finish();
        assert_eq!(set.get("xfs_crc").unwrap().failures, vec!["generic/001"]);
    }

    #[test]
    fn header_closes_block_and_opens_next() {
        let s = scan(&[
            "xfs_crc: 10 tests, 1 failures, 1 skipped, 100 seconds",
            "  Failures: generic/001",
            "xfs_reflink: 10 tests, 0 failures, 1 skipped, 100 seconds",
        ]);
        assert_eq!(s.state(), ScanState::SeekingProfileHeader);
        assert_eq!(s.current_profile(), Some("xfs_reflink"));
    }

    #[test]
    fn failures_line_without_header_is_ignored() {
        let s = scan(&["  Failures: generic/001"]);
        assert_eq!(s.state(), ScanState::SeekingProfileHeader);
        assert!(s.finish().is_empty());
    }

    #[test]
    fn finish_reaches_done() {
        let mut s = scan(&["xfs_crc: 10 tests, 0 failures, 1 skipped, 100 seconds"]);
        s.feed("anything");
        let set = s.finish();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn declared_totals_are_used_verbatim() {
        let body = "\
xfs_crc: 10 tests, 1 failures, 1 skipped, 100 seconds
  Failures: generic/001
Totals: 99 tests, 7 skipped, 5 failures, 2 errors, 1234s
";
        let parsed = parse_profiles(body);
        assert!(parsed.totals_declared);
        assert_eq!(
            parsed.totals,
            Totals {
                test_count: 99,
                skipped_count: 7,
                failure_count: 5,
                error_count: 2,
                duration_seconds: 1234,
            }
        );
    }

    #[test]
    fn crlf_lines_are_accepted() {
        let body = "xfs_crc: 10 tests, 1 failures, 1 skipped, 100 seconds\r\n  Failures: generic/001\r\n";
        let parsed = parse_profiles(body);
        assert_eq!(
            parsed.profiles.get("xfs_crc").unwrap().failures,
            vec!["generic/001"]
        );
    }
}
