//! Configuration surface for a single invocation.
//!
//! Everything the tool recognizes is collected here: one [`Settings`] value is
//! parsed at process entry and passed into each component. No component reads
//! flags or ambient state on its own.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line and environment configuration.
///
/// Every flag has an environment fallback so the tool can be driven either
/// directly or from a CI workflow definition.
#[derive(Debug, Clone, Parser)]
#[command(name = "testwire")]
#[command(about = "Ship CI test-run results to a remote log endpoint", long_about = None)]
#[command(version)]
pub struct Settings {
    /// Path of the test-run report produced by the test framework
    #[arg(long, env = "TESTWIRE_REPORT_FILE", default_value = "test-results.json")]
    pub report_file: PathBuf,

    /// Log-ingestion endpoint URL
    #[arg(long, env = "TESTWIRE_ENDPOINT")]
    pub endpoint: String,

    /// API credential attached to every delivery request
    #[arg(long, env = "TESTWIRE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Exit with code 1 instead of 0 when the report is missing or malformed
    #[arg(long, env = "TESTWIRE_FAIL_PIPELINE", value_parser = clap::builder::FalseyValueParser::new())]
    pub fail_pipeline: bool,

    /// Echo the raw report and every outbound payload to diagnostic output
    #[arg(short, long, env = "TESTWIRE_VERBOSE", value_parser = clap::builder::FalseyValueParser::new())]
    pub verbose: bool,

    /// Override the job id used in run metadata and artifact names
    #[arg(long, env = "TESTWIRE_JOB_ID")]
    pub job_id: Option<String>,

    /// Dashboard link appended to the failure summary
    #[arg(long, env = "TESTWIRE_DASHBOARD_URL")]
    pub dashboard_url: Option<String>,

    /// Also store a copy of the raw report file as a build artifact
    #[arg(long, env = "TESTWIRE_UPLOAD_REPORT", value_parser = clap::builder::FalseyValueParser::new())]
    pub upload_report: bool,

    /// Delivery attempts per batch before falling back to a local artifact
    #[arg(long, env = "TESTWIRE_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Maximum number of records per delivery request
    #[arg(long, env = "TESTWIRE_MAX_BATCH_SIZE", default_value_t = 70)]
    pub max_batch_size: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "TESTWIRE_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Directory where undelivered batches and report copies are kept
    #[arg(long, env = "TESTWIRE_ARTIFACT_DIR", default_value = "undelivered-results")]
    pub artifact_dir: PathBuf,

    /// Path prefix stripped from test file paths in outbound records
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub project_root: Option<String>,
}

impl Settings {
    /// Exit code used when the report is missing or not in the expected shape.
    pub fn failure_exit_code(&self) -> i32 {
        if self.fail_pipeline { 1 } else { 0 }
    }

    /// Timeout applied to every delivery attempt.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["testwire", "--endpoint", "https://logs.example/v1", "--api-key", "k"];
        argv.extend_from_slice(args);
        Settings::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let settings = parse(&[]);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.max_batch_size, 70);
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.report_file, PathBuf::from("test-results.json"));
        assert_eq!(settings.failure_exit_code(), 0);
    }

    #[test]
    fn fail_pipeline_flips_exit_code() {
        let settings = parse(&["--fail-pipeline"]);
        assert_eq!(settings.failure_exit_code(), 1);
    }
}
