//! Markdown rendering of progress reports.
//!
//! The generated document includes:
//!
//! - A summary table with key metrics
//! - A weekly progress table
//! - A daily checklist
//! - The score trend and weak points
//!
//! # Example
//!
//! ```rust
//! use roadmap_report::{DayInput, MarkdownGenerator, ReportGenerator, ReportInput};
//!
//! let input = ReportInput {
//!     days: vec![DayInput { day: 1, week: 1, ..DayInput::default() }],
//!     ..ReportInput::default()
//! };
//! let report = ReportGenerator::new(&input).generate().unwrap();
//!
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# TOEIC 800 Roadmap Progress Report"));
//! ```

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::{DayRow, ProgressReport, WeekRow};

/// Generates Markdown documents from a [`ProgressReport`].
pub struct MarkdownGenerator<'a> {
    report: &'a ProgressReport,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a ProgressReport) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        Self::write_title(&mut output);
        self.write_summary(&mut output);
        self.write_weeks(&mut output);
        self.write_days(&mut output);
        self.write_scores(&mut output);
        self.write_weak_points(&mut output);
        self.write_footer(&mut output);

        output
    }

    fn write_title(output: &mut String) {
        let _ = writeln!(output, "# TOEIC 800 Roadmap Progress Report\n");
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(
            output,
            "| Current Day | Day {} / {} |",
            summary.current_day, summary.total_days
        );
        let _ = writeln!(
            output,
            "| Tasks Completed | {} / {} ({}%) |",
            summary.completed_tasks, summary.total_tasks, summary.completion_percent
        );
        let _ = writeln!(output, "| Tasks Remaining | {} |", summary.remaining_tasks);
        let _ = writeln!(
            output,
            "| Days Complete | {} / {} |",
            summary.completed_days, summary.total_days
        );
        let _ = writeln!(
            output,
            "| Study Time | {} / {} |",
            format_minutes(summary.completed_minutes),
            format_minutes(summary.planned_minutes)
        );
        let _ = writeln!(output);
    }

    fn write_weeks(&self, output: &mut String) {
        let _ = writeln!(output, "## Weekly Progress\n");
        let _ = writeln!(output, "| Week | Title | Tasks | Days Complete | Planned |");
        let _ = writeln!(output, "|------|-------|-------|---------------|---------|");
        for row in &self.report.weeks {
            Self::write_week_row(output, row);
        }
        let _ = writeln!(output);
    }

    fn write_week_row(output: &mut String, row: &WeekRow) {
        let _ = writeln!(
            output,
            "| {} | {} | {}/{} | {}/{} | {} |",
            row.week,
            escape_markdown(&row.title),
            row.completed_tasks,
            row.total_tasks,
            row.completed_days,
            row.total_days,
            format_minutes(row.planned_minutes)
        );
    }

    fn write_days(&self, output: &mut String) {
        let _ = writeln!(output, "## Daily Checklist\n");
        for day in &self.report.days {
            Self::write_day(output, day);
        }
    }

    fn write_day(output: &mut String, day: &DayRow) {
        let marker = if day.complete { " ✅" } else { "" };
        let _ = writeln!(
            output,
            "### Day {}: {}{marker}\n",
            day.day,
            escape_markdown(&day.theme)
        );
        if day.tasks.is_empty() {
            let _ = writeln!(output, "*No tasks planned.*\n");
            return;
        }
        for task in &day.tasks {
            let check = if task.completed { "x" } else { " " };
            let _ = writeln!(
                output,
                "- [{check}] **{}** {} ({} min)",
                task.kind,
                escape_markdown(&task.title),
                task.duration
            );
        }
        let _ = writeln!(output);
    }

    fn write_scores(&self, output: &mut String) {
        let trend = &self.report.score_trend;
        let _ = writeln!(output, "## Score Trend\n");
        if trend.samples.is_empty() {
            let _ = writeln!(output, "*No score samples recorded.*\n");
            return;
        }

        let _ = writeln!(output, "| Week | Score |");
        let _ = writeln!(output, "|------|-------|");
        for sample in &trend.samples {
            let _ = writeln!(output, "| {} | {} |", escape_markdown(&sample.label), sample.score);
        }
        let _ = writeln!(output);
        if let Some(change) = trend.change {
            let _ = writeln!(output, "**Change**: {change:+} points\n");
        }
    }

    fn write_weak_points(&self, output: &mut String) {
        let _ = writeln!(output, "## Weak Points\n");
        if self.report.weak_points.is_empty() {
            let _ = writeln!(output, "*None recorded.*\n");
            return;
        }
        for point in &self.report.weak_points {
            let _ = writeln!(output, "- {}", escape_markdown(point));
        }
        let _ = writeln!(output);
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---");
        let _ = writeln!(
            output,
            "*Generated by roadmap at {}*",
            format_timestamp(&self.report.generated_at)
        );
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats minutes as `Xh Ym`, or `Ym` under an hour.
fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes characters that would break Markdown tables or emphasis.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '[' | ']' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::tests::sample_input;
    use crate::ReportGenerator;

    fn sample_report() -> ProgressReport {
        ReportGenerator::new(&sample_input()).generate().unwrap()
    }

    #[test]
    fn test_summary_section() {
        let report = sample_report();
        let mut output = String::new();
        MarkdownGenerator::new(&report).write_summary(&mut output);

        assert_snapshot!(output, @r"
        ## Summary

        | Metric | Value |
        |--------|-------|
        | Current Day | Day 2 / 3 |
        | Tasks Completed | 3 / 5 (60%) |
        | Tasks Remaining | 2 |
        | Days Complete | 1 / 3 |
        | Study Time | 2h 30m / 3h 30m |
        ");
    }

    #[test]
    fn test_weekly_section() {
        let report = sample_report();
        let mut output = String::new();
        MarkdownGenerator::new(&report).write_weeks(&mut output);

        assert_snapshot!(output, @r"
        ## Weekly Progress

        | Week | Title | Tasks | Days Complete | Planned |
        |------|-------|-------|---------------|---------|
        | 1 | 1주차: 기초 체력 | 3/4 | 1/2 | 3h |
        | 2 | 2주차: 심화 적응 | 0/1 | 0/1 | 30m |
        ");
    }

    #[test]
    fn test_full_report_sections_in_order() {
        let markdown = MarkdownGenerator::new(&sample_report()).generate();

        let order = [
            "# TOEIC 800 Roadmap Progress Report",
            "## Summary",
            "## Weekly Progress",
            "## Daily Checklist",
            "## Score Trend",
            "## Weak Points",
            "*Generated by roadmap at 2026-03-02 09:30:00 UTC*",
        ];
        let positions: Vec<usize> = order.iter().map(|s| markdown.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_daily_checklist_marks_completion() {
        let markdown = MarkdownGenerator::new(&sample_report()).generate();

        assert!(markdown.contains("### Day 1: 토익 LC/RC 구성 파악 및 진단 ✅"));
        assert!(markdown.contains("### Day 2: Part 5 문법: 동사의 수일치와 태\n"));
        assert!(markdown.contains("- [x] **VOCAB** VOCAB task (30 min)"));
        assert!(markdown.contains("- [ ] **VOCAB** VOCAB task (30 min)"));
    }

    #[test]
    fn test_score_trend_and_weak_points() {
        let markdown = MarkdownGenerator::new(&sample_report()).generate();

        assert!(markdown.contains("| W3 | 780 |"));
        assert!(markdown.contains("**Change**: +130 points"));
        assert!(markdown.contains("- Part 5 전치사/접속사"));
    }

    #[test]
    fn test_empty_scores_and_weak_points() {
        let mut input = sample_input();
        input.weekly_scores.clear();
        input.weak_points.clear();
        let report = ReportGenerator::new(&input).generate().unwrap();
        let markdown = MarkdownGenerator::new(&report).generate();

        assert!(markdown.contains("*No score samples recorded.*"));
        assert!(markdown.contains("*None recorded.*"));
        assert!(!markdown.contains("**Change**"));
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(130), "2h 10m");
        assert_eq!(format_minutes(0), "0m");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a|b"), "a\\|b");
        assert_eq!(escape_markdown("**bold**"), "\\*\\*bold\\*\\*");
        assert_eq!(escape_markdown("line1\nline2"), "line1<br>line2");
        assert_eq!(escape_markdown("LC Part 1&2 (사진/질의응답)"), "LC Part 1&2 (사진/질의응답)");
    }
}
