//! `key: value` fields embedded in a report body.
//!
//! Every field is optional. The first occurrence of a key wins and absent
//! keys stay `None`; nothing here can fail.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::kernel::UNKNOWN_KERNEL;

struct FieldPatterns {
    workflow: Regex,
    kernel: Regex,
    selftests_kernel: Regex,
    cpus: Regex,
    tree: Regex,
    git_ref: Regex,
    test_result: Regex,
    test_number: Regex,
}

fn text_field(key: &str) -> Regex {
    Regex::new(&format!(r"(?m)\b{key}:[ \t]*(\S.*?)[ \t]*\r?$")).expect("text field regex")
}

fn patterns() -> &'static FieldPatterns {
    static PATTERNS: OnceLock<FieldPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| FieldPatterns {
        workflow: text_field("workflow"),
        kernel: text_field("KERNEL"),
        selftests_kernel: Regex::new(r"workflows/selftests/results/last-run/([\w.\-]+\+?)/")
            .expect("selftests kernel regex"),
        cpus: Regex::new(r"\bCPUS:\s+(\d+)").expect("cpus regex"),
        tree: text_field("tree"),
        git_ref: text_field("ref"),
        test_result: text_field("test result"),
        test_number: Regex::new(r"\btest number:\s+(\d+)").expect("test number regex"),
    })
}

fn capture(re: &Regex, body: &str) -> Option<String> {
    re.captures(body).map(|caps| caps[1].trim().to_string())
}

/// Fields recognised in a report body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFields {
    pub workflow: Option<String>,
    pub kernel: Option<String>,
    pub cpus: Option<u32>,
    pub tree: Option<String>,
    pub git_ref: Option<String>,
    pub test_result: Option<String>,
    /// Digits as written, leading zeros kept.
    pub test_number: Option<String>,
}

impl ReportFields {
    pub fn parse(body: &str) -> Self {
        let p = patterns();
        let kernel = capture(&p.kernel, body).or_else(|| capture(&p.selftests_kernel, body));
        Self {
            workflow: capture(&p.workflow, body),
            kernel,
            cpus: capture(&p.cpus, body).and_then(|v| v.parse().ok()),
            tree: capture(&p.tree, body),
            git_ref: capture(&p.git_ref, body),
            test_result: capture(&p.test_result, body),
            test_number: capture(&p.test_number, body),
        }
    }

    /// Kernel version token, or the `Unknown` literal.
    pub fn kernel_or_unknown(&self) -> &str {
        self.kernel.as_deref().unwrap_or(UNKNOWN_KERNEL)
    }

    /// Case-insensitive check of the declared workflow. Reports without a
    /// `workflow:` field never match.
    pub fn workflow_contains(&self, needle: &str) -> bool {
        self.workflow
            .as_deref()
            .map(|w| w.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    }
}
