//! Operator-facing summary of failed test cases.
//!
//! Pure observer: runs off the classified failures and has no effect on
//! delivery or on the exit code.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::classify::strip_project_root;
use crate::metadata::RunContext;
use crate::report::RawTestCase;

/// Print the failure table to the terminal and, when the platform collects
/// one, append a markdown table to the step summary file.
pub fn report_failures(
    failures: &[RawTestCase],
    ctx: &RunContext,
    project_root: Option<&str>,
    dashboard_url: Option<&str>,
) {
    if failures.is_empty() {
        return;
    }

    print_console(failures, project_root);

    if let Some(path) = &ctx.step_summary
        && let Err(err) = append_step_summary(path, failures, ctx, project_root, dashboard_url)
    {
        warn!("could not write step summary: {err:#}");
    }
}

fn display_file(case: &RawTestCase, project_root: Option<&str>) -> Option<String> {
    case.file
        .as_deref()
        .map(|file| strip_project_root(file, project_root))
}

fn print_console(failures: &[RawTestCase], project_root: Option<&str>) {
    println!();
    println!(
        "{}",
        console::style(format!("Failed test cases ({}):", failures.len()))
            .red()
            .bold()
    );
    for case in failures {
        println!("  - {}", console::style(&case.full_title).bold());
        if let Some(file) = display_file(case, project_root) {
            println!("    {}", console::style(file).dim());
        }
        if let Some(message) = &case.err.message {
            println!("    {message}");
        }
        if let Some(stack) = &case.err.stack {
            for line in stack.lines() {
                println!("      {}", console::style(line).dim());
            }
        }
    }
    println!();
}

fn append_step_summary(
    path: &Path,
    failures: &[RawTestCase],
    ctx: &RunContext,
    project_root: Option<&str>,
    dashboard_url: Option<&str>,
) -> Result<()> {
    let mut md = String::new();
    md.push_str("### :test_tube: Failed test cases\n\n");
    md.push_str("| File | Test title | Test full title | Duration [ms] | Error message |\n");
    md.push_str("| --- | --- | --- | --- | --- |\n");

    for case in failures {
        let file_cell = match (display_file(case, project_root), &ctx.file_link_base) {
            (Some(file), Some(base)) => format!("[{}]({base}/{file})", cell(&file)),
            (Some(file), None) => cell(&file),
            (None, _) => "-".to_string(),
        };
        let duration = case
            .duration
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let message = case.err.message.as_deref().unwrap_or("-");

        writeln!(
            md,
            "| {file_cell} | {} | {} | {duration} | {} |",
            cell(&case.title),
            cell(&case.full_title),
            cell(message),
        )?;
    }

    if let Some(url) = dashboard_url {
        writeln!(md, "\n[For overall stats, see the dashboard]({url})")?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(md.as_bytes())
        .with_context(|| format!("failed to append to {}", path.display()))?;
    Ok(())
}

/// Make a value safe for a markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RunMetadata;
    use crate::report::ErrorInfo;

    fn failure() -> RawTestCase {
        RawTestCase {
            file: Some("/work/repo/spec/login.cy.js".to_string()),
            title: "logs in".to_string(),
            full_title: "auth logs in".to_string(),
            duration: Some(12.0),
            err: ErrorInfo {
                message: Some("expected | got".to_string()),
                stack: Some("at spec/login.cy.js:4".to_string()),
            },
        }
    }

    fn ctx(step_summary: Option<std::path::PathBuf>) -> RunContext {
        RunContext {
            metadata: RunMetadata::default(),
            file_link_base: Some("https://github.example/org/repo/blob/abc123".to_string()),
            step_summary,
        }
    }

    #[test]
    fn step_summary_table_links_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let summary_path = dir.path().join("summary.md");
        let ctx = ctx(Some(summary_path.clone()));

        report_failures(&[failure()], &ctx, Some("/work/repo"), Some("https://dash.example"));

        let md = std::fs::read_to_string(&summary_path).unwrap();
        assert!(md.contains("### :test_tube: Failed test cases"));
        assert!(md.contains(
            "[spec/login.cy.js](https://github.example/org/repo/blob/abc123/spec/login.cy.js)"
        ));
        assert!(md.contains("| logs in | auth logs in | 12 |"));
        assert!(md.contains("expected \\| got"));
        assert!(md.contains("[For overall stats, see the dashboard](https://dash.example)"));
    }

    #[test]
    fn appends_rather_than_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let summary_path = dir.path().join("summary.md");
        std::fs::write(&summary_path, "earlier step output\n").unwrap();
        let ctx = ctx(Some(summary_path.clone()));

        report_failures(&[failure()], &ctx, None, None);

        let md = std::fs::read_to_string(&summary_path).unwrap();
        assert!(md.starts_with("earlier step output\n"));
        assert!(md.contains("Failed test cases"));
    }

    #[test]
    fn no_failures_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let summary_path = dir.path().join("summary.md");
        let ctx = ctx(Some(summary_path.clone()));

        report_failures(&[], &ctx, None, None);

        assert!(!summary_path.exists());
    }
}
