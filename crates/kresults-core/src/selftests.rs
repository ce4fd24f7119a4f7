//! Memory-management selftest summaries.
//!
//! Kernel-side lines carry an origin and a `kernel:` tag
//! (`mm kernel: ksm: 10 of 12 tests passed`); userspace lines do not
//! (`hugetlb: 3 of 3 tests passed`). A line is classified once, kernel-side
//! first, and the first result for a name wins.

use std::collections::btree_map::Entry;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{SelftestCount, SelftestResults};

fn kernel_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\w+ kernel: (\w+): (\d+) of (\d+) tests passed").expect("kernel selftest regex")
    })
}

fn userspace_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\w+): (\d+) of (\d+) tests passed").expect("userspace selftest regex")
    })
}

fn count(caps: &regex::Captures<'_>) -> (String, SelftestCount) {
    let passed = caps[2].parse().unwrap_or_default();
    let total = caps[3].parse().unwrap_or_default();
    (caps[1].to_lowercase(), SelftestCount::new(passed, total))
}

pub fn parse_selftests(body: &str) -> SelftestResults {
    let mut results = SelftestResults::default();

    for line in body.lines() {
        let (side, (name, counts)) = if let Some(caps) = kernel_line_regex().captures(line) {
            (&mut results.kernel, count(&caps))
        } else if let Some(caps) = userspace_line_regex().captures(line) {
            (&mut results.userspace, count(&caps))
        } else {
            continue;
        };
        if let Entry::Vacant(slot) = side.entry(name) {
            slot.insert(counts);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_and_userspace_lines_are_split() {
        let body = "\
mm kernel: KSM: 10 of 12 tests passed
hugetlb: 3 of 3 tests passed
";
        let r = parse_selftests(body);
        assert_eq!(r.kernel.len(), 1);
        assert_eq!(r.userspace.len(), 1);
        assert_eq!(r.kernel["ksm"], SelftestCount::new(10, 12));
        assert_eq!(r.kernel["ksm"].failed, 2);
        assert_eq!(r.userspace["hugetlb"].failed, 0);
    }

    #[test]
    fn kernel_line_is_not_counted_twice() {
        let r = parse_selftests("mm kernel: ksm: 10 of 12 tests passed\n");
        assert!(r.userspace.is_empty());
        assert_eq!(r.total_tests(), 12);
        assert_eq!(r.total_failures(), 2);
    }

    #[test]
    fn first_result_for_a_name_wins() {
        let body = "cow: 5 of 10 tests passed\ncow: 10 of 10 tests passed\n";
        let r = parse_selftests(body);
        assert_eq!(r.userspace["cow"].passed, 5);
    }

    #[test]
    fn no_lines_is_empty() {
        let r = parse_selftests("workflow: selftests\n");
        assert!(r.is_empty());
        assert_eq!(r.to_totals().test_count, 0);
    }
}
