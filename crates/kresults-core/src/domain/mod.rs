//! Domain models for kresults.
//!
//! Canonical definitions for the entities handed between pipeline stages:
//! - `KernelVersion`: parsed and classified kernel version token
//! - `CommitRecord`: one classified, parsed CI report
//! - `TestProfile` / `Totals`: per-suite and run-level counters

pub mod error;
pub mod kernel;
pub mod record;

pub use error::{KresultsError, Result};
pub use kernel::{is_official_release, release_kind_of, KernelVersion, ReleaseKind};
pub use record::{
    CommitRecord, KindFields, ProfileSet, ReportFamily, SelftestCount, SelftestResults,
    TestKind, TestProfile, Totals, UNKNOWN_FILESYSTEM,
};
