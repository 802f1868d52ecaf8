//! Per-case outcome classification and record normalization.

use serde::Serialize;

use crate::report::RawTestCase;

/// Outcome category of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Skipped,
    Failed,
}

impl Outcome {
    /// The log line attached to records of this outcome.
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Passed => "testwire: test case PASSED",
            Outcome::Skipped => "testwire: test case SKIPPED",
            Outcome::Failed => "testwire: test case FAILED",
        }
    }
}

/// Classify a raw test case.
///
/// The failure check wins: a case with error details and no duration is
/// Failed, not Skipped. A case with no error and no duration never ran.
pub fn classify(case: &RawTestCase) -> Outcome {
    if !case.err.is_empty() {
        Outcome::Failed
    } else if case.duration.is_none() {
        Outcome::Skipped
    } else {
        Outcome::Passed
    }
}

/// Normalized, transmission-ready representation of one test case.
///
/// Created once during batch assembly and never mutated afterwards. The
/// serialized shape is the wire format the endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRecord {
    pub message: String,
    pub attributes: RecordAttributes,
}

/// Wire attributes of a delivery record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
    pub test_suite: String,
    pub test_title: String,
    pub test_full_title: String,
    pub test_failure: bool,
    pub test_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
}

impl DeliveryRecord {
    /// Build the outbound record for `case` under the given outcome.
    ///
    /// Strips `project_root` from the file path when present (an absent path
    /// stays absent), derives the suite name from the full title, and carries
    /// error details only for failures.
    pub fn from_case(case: &RawTestCase, outcome: Outcome, project_root: Option<&str>) -> Self {
        let failed = outcome == Outcome::Failed;
        DeliveryRecord {
            message: outcome.message().to_string(),
            attributes: RecordAttributes {
                test_file: case
                    .file
                    .as_deref()
                    .map(|file| strip_project_root(file, project_root)),
                test_suite: suite_name(&case.full_title, &case.title),
                test_title: case.title.clone(),
                test_full_title: case.full_title.clone(),
                test_failure: failed,
                test_duration: if outcome == Outcome::Skipped {
                    None
                } else {
                    case.duration
                },
                error_message: if failed { case.err.message.clone() } else { None },
                error_stack: if failed { case.err.stack.clone() } else { None },
            },
        }
    }
}

/// Strip the project-root prefix from a file path, if it is there.
pub(crate) fn strip_project_root(path: &str, project_root: Option<&str>) -> String {
    match project_root {
        Some(root) => path
            .strip_prefix(root)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(path)
            .to_string(),
        None => path.to_string(),
    }
}

/// Suite name: the full title with the trailing occurrence of the title
/// removed, trimmed.
fn suite_name(full_title: &str, title: &str) -> String {
    if title.is_empty() {
        return full_title.trim().to_string();
    }
    match full_title.rfind(title) {
        Some(start) => {
            let mut suite = String::with_capacity(full_title.len() - title.len());
            suite.push_str(&full_title[..start]);
            suite.push_str(&full_title[start + title.len()..]);
            suite.trim().to_string()
        }
        None => full_title.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ErrorInfo;

    fn case(duration: Option<f64>, err: ErrorInfo) -> RawTestCase {
        RawTestCase {
            file: Some("/work/repo/spec/login.cy.js".to_string()),
            title: "logs in".to_string(),
            full_title: "auth logs in".to_string(),
            duration,
            err,
        }
    }

    fn error(message: &str) -> ErrorInfo {
        ErrorInfo {
            message: Some(message.to_string()),
            stack: Some(format!("{message}\n  at spec/login.cy.js:4")),
        }
    }

    #[test]
    fn error_info_means_failed_regardless_of_duration() {
        assert_eq!(classify(&case(Some(12.0), error("boom"))), Outcome::Failed);
        assert_eq!(classify(&case(None, error("boom"))), Outcome::Failed);
    }

    #[test]
    fn no_error_and_no_duration_means_skipped() {
        assert_eq!(classify(&case(None, ErrorInfo::default())), Outcome::Skipped);
    }

    #[test]
    fn no_error_with_duration_means_passed() {
        assert_eq!(classify(&case(Some(5.0), ErrorInfo::default())), Outcome::Passed);
    }

    #[test]
    fn stack_only_error_still_fails() {
        let err = ErrorInfo {
            message: None,
            stack: Some("at somewhere".to_string()),
        };
        assert_eq!(classify(&case(Some(1.0), err)), Outcome::Failed);
    }

    #[test]
    fn record_strips_project_root() {
        let record = DeliveryRecord::from_case(
            &case(Some(5.0), ErrorInfo::default()),
            Outcome::Passed,
            Some("/work/repo"),
        );
        assert_eq!(record.attributes.test_file.as_deref(), Some("spec/login.cy.js"));
    }

    #[test]
    fn unrelated_root_leaves_path_alone() {
        let record = DeliveryRecord::from_case(
            &case(Some(5.0), ErrorInfo::default()),
            Outcome::Passed,
            Some("/elsewhere"),
        );
        assert_eq!(
            record.attributes.test_file.as_deref(),
            Some("/work/repo/spec/login.cy.js")
        );
    }

    #[test]
    fn absent_path_stays_absent() {
        let mut c = case(Some(5.0), ErrorInfo::default());
        c.file = None;
        let record = DeliveryRecord::from_case(&c, Outcome::Passed, Some("/work/repo"));
        assert!(record.attributes.test_file.is_none());
    }

    #[test]
    fn suite_name_removes_trailing_title_occurrence() {
        assert_eq!(suite_name("suite t1", "t1"), "suite");
        assert_eq!(suite_name("t1 suite t1", "t1"), "t1 suite");
        assert_eq!(suite_name("suite", "t1"), "suite");
    }

    #[test]
    fn skipped_record_has_null_duration_and_no_error() {
        let record = DeliveryRecord::from_case(
            &case(None, ErrorInfo::default()),
            Outcome::Skipped,
            None,
        );
        assert_eq!(record.message, "testwire: test case SKIPPED");
        assert!(!record.attributes.test_failure);
        assert!(record.attributes.test_duration.is_none());
        assert!(record.attributes.error_message.is_none());
    }

    #[test]
    fn failed_record_carries_error_details() {
        let record =
            DeliveryRecord::from_case(&case(Some(12.0), error("boom")), Outcome::Failed, None);
        assert!(record.attributes.test_failure);
        assert_eq!(record.attributes.error_message.as_deref(), Some("boom"));
        assert!(record.attributes.error_stack.is_some());
        assert_eq!(record.attributes.test_duration, Some(12.0));
    }

    #[test]
    fn wire_shape_uses_camel_case_and_omits_absent_fields() {
        let record = DeliveryRecord::from_case(
            &case(Some(5.0), ErrorInfo::default()),
            Outcome::Passed,
            Some("/work/repo"),
        );
        let value = serde_json::to_value(&record).unwrap();
        let attrs = &value["attributes"];
        assert_eq!(attrs["testSuite"], "auth");
        assert_eq!(attrs["testTitle"], "logs in");
        assert_eq!(attrs["testFullTitle"], "auth logs in");
        assert_eq!(attrs["testFailure"], false);
        assert_eq!(attrs["testDuration"], 5.0);
        assert!(attrs.get("errorMessage").is_none());
        assert!(attrs.get("errorStack").is_none());
    }
}
