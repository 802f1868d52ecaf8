//! CI run context.
//!
//! This is the only module that touches `GITHUB_*`/`RUNNER_*` environment
//! variables. Everything downstream works with the resolved [`RunContext`]
//! built once at startup.

use std::env;
use std::path::PathBuf;

use serde::Serialize;

/// Static-per-invocation tags describing the CI run, attached to every batch.
///
/// Serialized keys are the dotted attribute names the log endpoint indexes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetadata {
    #[serde(rename = "git.branch")]
    pub branch: String,
    #[serde(rename = "git.ref")]
    pub git_ref: String,
    #[serde(rename = "git.sha")]
    pub sha: String,
    #[serde(rename = "github.action")]
    pub action: String,
    #[serde(rename = "github.workflow")]
    pub workflow: String,
    #[serde(rename = "github.project")]
    pub project: String,
    #[serde(rename = "github.job")]
    pub job: String,
    #[serde(rename = "github.eventName")]
    pub event_name: String,
    #[serde(rename = "github.actor")]
    pub actor: String,
    #[serde(rename = "github.runId")]
    pub run_id: Option<u64>,
    #[serde(rename = "github.runNumber")]
    pub run_number: Option<u64>,
    #[serde(rename = "github.runAttempt")]
    pub run_attempt: Option<u64>,
    #[serde(rename = "github.runner.arch")]
    pub runner_arch: Option<String>,
    #[serde(rename = "github.runner.os")]
    pub runner_os: Option<String>,
    #[serde(rename = "github.runner.name")]
    pub runner_name: Option<String>,
}

/// Resolved run context: the metadata attached to every batch plus the
/// summary-only values derived from the same environment.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub metadata: RunMetadata,
    /// `{server}/{repo}/blob/{sha}`, for linking failed files in the summary.
    pub file_link_base: Option<String>,
    /// Where the platform collects step-summary markdown, when it does.
    pub step_summary: Option<PathBuf>,
}

impl RunContext {
    /// Read the CI environment once. `job_override` wins over the platform's
    /// own job id.
    pub fn from_env(job_override: Option<&str>) -> Self {
        let git_ref = env::var("GITHUB_REF").unwrap_or_default();
        let head_ref = env::var("GITHUB_HEAD_REF").ok();
        let repository = env::var("GITHUB_REPOSITORY").ok();
        let sha = env::var("GITHUB_SHA").unwrap_or_default();

        let project = repository
            .as_deref()
            .and_then(|repo| repo.rsplit('/').next())
            .unwrap_or_default()
            .to_string();

        let job = job_override
            .map(str::to_string)
            .or_else(|| env::var("GITHUB_JOB").ok())
            .unwrap_or_default();

        let metadata = RunMetadata {
            branch: derive_branch(&git_ref, head_ref.as_deref()),
            git_ref: git_ref.clone(),
            sha: sha.clone(),
            action: env::var("GITHUB_ACTION").unwrap_or_default(),
            workflow: env::var("GITHUB_WORKFLOW").unwrap_or_default(),
            project,
            job,
            event_name: env::var("GITHUB_EVENT_NAME").unwrap_or_default(),
            actor: env::var("GITHUB_ACTOR").unwrap_or_default(),
            run_id: numeric_var("GITHUB_RUN_ID"),
            run_number: numeric_var("GITHUB_RUN_NUMBER"),
            run_attempt: numeric_var("GITHUB_RUN_ATTEMPT"),
            runner_arch: env::var("RUNNER_ARCH").ok(),
            runner_os: env::var("RUNNER_OS").ok(),
            runner_name: env::var("RUNNER_NAME").ok(),
        };

        let file_link_base = match (env::var("GITHUB_SERVER_URL").ok(), repository) {
            (Some(server), Some(repo)) if !sha.is_empty() => {
                Some(format!("{server}/{repo}/blob/{sha}"))
            }
            _ => None,
        };

        RunContext {
            metadata,
            file_link_base,
            step_summary: env::var("GITHUB_STEP_SUMMARY").ok().map(PathBuf::from),
        }
    }
}

/// Branch name for the run.
///
/// Strips `refs/heads/`. A pull-request or release-tag ref has no meaningful
/// branch of its own, so the pull-request source branch is used instead.
fn derive_branch(git_ref: &str, head_ref: Option<&str>) -> String {
    let branch = git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref);
    if branch.starts_with("refs/pull/") || branch.starts_with("refs/tags/") {
        head_ref.unwrap_or_default().to_string()
    } else {
        branch.to_string()
    }
}

fn numeric_var(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_branch_ref_is_stripped() {
        assert_eq!(derive_branch("refs/heads/main", None), "main");
        assert_eq!(derive_branch("refs/heads/feat/login", Some("x")), "feat/login");
    }

    #[test]
    fn pull_request_ref_uses_head_ref() {
        assert_eq!(derive_branch("refs/pull/7/merge", Some("feature-x")), "feature-x");
    }

    #[test]
    fn release_tag_ref_uses_head_ref() {
        assert_eq!(derive_branch("refs/tags/v1.2.0", Some("release")), "release");
        assert_eq!(derive_branch("refs/tags/v1.2.0", None), "");
    }

    #[test]
    fn non_ref_value_passes_through() {
        assert_eq!(derive_branch("main", None), "main");
    }

    #[test]
    fn metadata_serializes_under_dotted_keys() {
        let metadata = RunMetadata {
            branch: "main".to_string(),
            sha: "abc123".to_string(),
            job: "e2e".to_string(),
            run_id: Some(42),
            ..RunMetadata::default()
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["git.branch"], "main");
        assert_eq!(value["git.sha"], "abc123");
        assert_eq!(value["github.job"], "e2e");
        assert_eq!(value["github.runId"], 42);
        assert_eq!(value["github.runner.os"], serde_json::Value::Null);
    }
}
