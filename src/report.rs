//! Reading and validating the raw test-run report.
//!
//! The report is the JSON file a Mocha-style framework writes after a run:
//!
//! ```json
//! {
//!   "tests": [ { "file": "...", "title": "...", "fullTitle": "...", "duration": 5, "err": {} } ],
//!   "failures": [ ... ]
//! }
//! ```
//!
//! `tests` holds executed and skipped cases but not hook-only failures;
//! `failures` holds every failed case including hook failures. The two lists
//! are independent and both are consumed downstream.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

/// Result type for report reading.
pub type ReportResult<T> = Result<T, ReportError>;

/// Ways the report can be unavailable for this invocation.
///
/// None of these propagate past `main`: each becomes a warning plus the
/// configured exit code. There is no retry, report absence is terminal.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report file could not be read: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("report file is not valid JSON: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("report is not in the expected shape: missing the `{0}` list")]
    MissingField(&'static str),
}

/// One test execution as reported by the upstream framework.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTestCase {
    /// Source file the case lives in, when the framework knows it.
    #[serde(default)]
    pub file: Option<String>,

    /// Short title of the case.
    pub title: String,

    /// Hierarchical title: the enclosing suites plus the title.
    pub full_title: String,

    /// Execution time in milliseconds. Absent when the case never ran.
    #[serde(default)]
    pub duration: Option<f64>,

    /// Error details; an empty object for anything that did not fail.
    #[serde(default)]
    pub err: ErrorInfo,
}

/// Error message and stack as reported by the framework.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub stack: Option<String>,
}

impl ErrorInfo {
    /// True when the framework attached no error details at all.
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.stack.is_none()
    }
}

/// The parsed report file.
#[derive(Debug, Clone)]
pub struct RawReport {
    pub tests: Vec<RawTestCase>,
    pub failures: Vec<RawTestCase>,
}

#[derive(Deserialize)]
struct ReportWire {
    #[serde(default)]
    tests: Option<Vec<RawTestCase>>,
    #[serde(default)]
    failures: Option<Vec<RawTestCase>>,
}

/// Read and validate the report at `path`.
///
/// A successfully parsed value is usable only if both the `tests` and the
/// `failures` lists are present (possibly empty).
pub fn read_report(path: &Path) -> ReportResult<RawReport> {
    let raw = std::fs::read_to_string(path).map_err(ReportError::Unreadable)?;
    debug!(file = %path.display(), "raw report:\n{raw}");

    let wire: ReportWire = serde_json::from_str(&raw).map_err(ReportError::Invalid)?;
    let tests = wire.tests.ok_or(ReportError::MissingField("tests"))?;
    let failures = wire.failures.ok_or(ReportError::MissingField("failures"))?;

    Ok(RawReport { tests, failures })
}
