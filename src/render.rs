//! Plain-text rendering of batch results for the terminal

use std::fmt::Write;

use fleet_core::{BatchJobResult, JobStatus};
use fleet_dispatcher::{BatchReport, BatchSummary};

/// Longest output or error excerpt shown per result.
pub const EXCERPT_LIMIT: usize = 100;

/// Cut `text` to at most `limit` characters, marking the cut with `...`.
pub fn truncate(text: &str, limit: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn status_marker(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Success => "✓",
        JobStatus::Failed => "✗",
        JobStatus::Timeout => "⏱",
    }
}

pub fn render_result(result: &BatchJobResult) -> String {
    let mut line = format!(
        "{} {} [{}] {:.1}s, {} attempt(s)",
        status_marker(result.status),
        result.target,
        result.status,
        result.execution_time().as_secs_f64(),
        result.attempts
    );

    let detail = if result.status.is_success() {
        &result.output
    } else {
        &result.error
    };
    if !detail.trim().is_empty() {
        let _ = write!(line, "\n    {}", truncate(detail, EXCERPT_LIMIT));
    }
    line
}

pub fn render_summary(summary: &BatchSummary) -> String {
    format!(
        "Total: {}  Success: {}  Failed: {}  Timeout: {}",
        summary.total, summary.succeeded, summary.failed, summary.timed_out
    )
}

pub fn render_report(report: &BatchReport) -> String {
    if report.is_empty() {
        return format!("No reachable targets, `{}` was not run.", report.command);
    }

    let mut out = format!("Command: {}\n", report.command);
    for result in &report.results {
        out.push_str(&render_result(result));
        out.push('\n');
    }
    out.push_str(&render_summary(&report.summary()));
    out
}

pub fn render_history(entries: &[BatchJobResult]) -> String {
    if entries.is_empty() {
        return "No batch history yet.".to_string();
    }

    entries
        .iter()
        .map(|entry| {
            format!(
                "{} `{}` {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                truncate(&entry.command, 40),
                render_result(entry)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fleet_testing_utils::{targets, JobResultBuilder, TargetBuilder};

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 100), "short");
        let long = "é".repeat(150);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 103);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_render_result_shows_error_for_failures() {
        let target = targets(1, "local").remove(0);
        let failed = JobResultBuilder::new(target.clone())
            .failed(&"x".repeat(300))
            .with_attempts(4)
            .build();

        let text = render_result(&failed);
        assert!(text.starts_with("✗ host-i-000 (i-000) [FAILED]"));
        assert!(text.contains("4 attempt(s)"));
        assert!(text.lines().nth(1).unwrap().trim().len() <= EXCERPT_LIMIT + 3);

        let ok = JobResultBuilder::new(target).with_output("up 3 days").build();
        assert!(render_result(&ok).ends_with("up 3 days"));
    }

    #[test]
    fn test_render_empty_report() {
        let report = BatchReport::empty("uptime");
        assert!(render_report(&report).contains("`uptime` was not run"));
    }

    #[test]
    fn test_render_history_lines() {
        assert_eq!(render_history(&[]), "No batch history yet.");

        let target = TargetBuilder::new()
            .with_id("i-0abc")
            .with_name("db-primary")
            .with_location("eu-west-1")
            .build();
        let entry = JobResultBuilder::new(target)
            .with_command(&format!("echo {}", "y".repeat(60)))
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
            .build();

        let text = render_history(&[entry]);
        assert!(text.starts_with("2024-05-01 08:30:00 `echo yyy"));
        assert!(text.contains("...` ✓ db-primary (i-0abc) [SUCCESS]"));
    }
}
