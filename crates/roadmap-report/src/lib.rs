//! Roadmap Progress Reports
//!
//! This crate turns a snapshot of the 21-day roadmap into a progress report.
//! Reports can be serialized to JSON for programmatic access or rendered to
//! Markdown for human consumption.
//!
//! # Types
//!
//! - [`ReportInput`] - Plain snapshot of days, tasks, scores and weak points
//! - [`ReportGenerator`] - Derives a [`ProgressReport`] from an input
//! - [`ProgressReport`] - Summary, weekly rows, daily checklist and score trend
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use roadmap_report::{DayInput, ReportGenerator, ReportInput, TaskInput};
//! use roadmap_report::json::JsonGenerator;
//!
//! let input = ReportInput {
//!     current_day: 1,
//!     days: vec![DayInput {
//!         day: 1,
//!         week: 1,
//!         week_title: "1주차: 기초 체력".to_string(),
//!         theme: "토익 LC/RC 구성 파악 및 진단".to_string(),
//!         tasks: vec![TaskInput {
//!             id: "d1-1".to_string(),
//!             kind: "VOCAB".to_string(),
//!             title: "Day 1 필수 어휘".to_string(),
//!             duration: 30,
//!             completed: true,
//!         }],
//!     }],
//!     ..ReportInput::default()
//! };
//!
//! let report = ReportGenerator::new(&input).generate().unwrap();
//! assert_eq!(report.summary.completion_percent, 100);
//!
//! let json = JsonGenerator::new(&report).generate_pretty().unwrap();
//! assert!(json.contains("\"completionPercent\": 100"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid report data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Input snapshot (kept independent of the core crate)
// ============================================================================

/// One task as seen by the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Task id (e.g. `d1-2`).
    pub id: String,
    /// Category label (e.g. `GRAMMAR`).
    pub kind: String,
    /// Task title.
    pub title: String,
    /// Planned minutes.
    pub duration: u32,
    /// Completion flag.
    pub completed: bool,
}

/// One day as seen by the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayInput {
    /// 1-based day number.
    pub day: u32,
    /// 1-based week number.
    pub week: u32,
    /// Title of the day's week.
    pub week_title: String,
    /// The day's theme.
    pub theme: String,
    /// The day's tasks.
    pub tasks: Vec<TaskInput>,
}

impl DayInput {
    fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    fn is_complete(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.completed)
    }

    fn planned_minutes(&self) -> u32 {
        self.tasks.iter().map(|t| t.duration).sum()
    }

    fn completed_minutes(&self) -> u32 {
        self.tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.duration)
            .sum()
    }
}

/// A weekly score sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    /// Week label (e.g. `W1`).
    pub label: String,
    /// Estimated score.
    pub score: u32,
}

/// Everything a report is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    /// Day currently selected by the learner.
    pub current_day: u32,
    /// Days in roadmap order.
    pub days: Vec<DayInput>,
    /// Weekly score trend.
    pub weekly_scores: Vec<ScoreInput>,
    /// Weak areas.
    pub weak_points: Vec<String>,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
}

impl Default for ReportInput {
    fn default() -> Self {
        Self {
            current_day: 1,
            days: Vec::new(),
            weekly_scores: Vec::new(),
            weak_points: Vec::new(),
            generated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Derived report
// ============================================================================

/// Aggregate progress numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    /// Day currently selected.
    pub current_day: u32,
    /// Days in the roadmap.
    pub total_days: usize,
    /// Days with every task completed.
    pub completed_days: usize,
    /// Tasks in the roadmap.
    pub total_tasks: usize,
    /// Completed tasks.
    pub completed_tasks: usize,
    /// Tasks still to complete.
    pub remaining_tasks: usize,
    /// Completed share of tasks, rounded down.
    pub completion_percent: u32,
    /// Minutes planned across the roadmap.
    pub planned_minutes: u32,
    /// Minutes of completed tasks.
    pub completed_minutes: u32,
}

/// One row of the weekly table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRow {
    /// 1-based week number.
    pub week: u32,
    /// Week title.
    pub title: String,
    /// Tasks in the week.
    pub total_tasks: usize,
    /// Completed tasks in the week.
    pub completed_tasks: usize,
    /// Days in the week.
    pub total_days: usize,
    /// Days with every task completed.
    pub completed_days: usize,
    /// Minutes planned in the week.
    pub planned_minutes: u32,
}

/// One day of the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRow {
    /// 1-based day number.
    pub day: u32,
    /// The day's theme.
    pub theme: String,
    /// The day's tasks.
    pub tasks: Vec<TaskInput>,
    /// `true` if every task is completed.
    pub complete: bool,
}

/// Score movement between the first and last sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTrend {
    /// Samples in order.
    pub samples: Vec<ScoreInput>,
    /// Last score minus first score; `None` with fewer than two samples.
    pub change: Option<i64>,
}

/// A complete progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// When the underlying snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Aggregate numbers.
    pub summary: ProgressSummary,
    /// Weekly rows.
    pub weeks: Vec<WeekRow>,
    /// Daily checklist.
    pub days: Vec<DayRow>,
    /// Score trend.
    pub score_trend: ScoreTrend,
    /// Weak areas.
    pub weak_points: Vec<String>,
}

impl ProgressReport {
    /// Serializes the report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Serialization` if JSON serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }
}

// ============================================================================
// ReportGenerator
// ============================================================================

/// Derives a [`ProgressReport`] from a [`ReportInput`].
pub struct ReportGenerator<'a> {
    input: &'a ReportInput,
}

impl<'a> ReportGenerator<'a> {
    /// Creates a generator for `input`.
    #[must_use]
    pub const fn new(input: &'a ReportInput) -> Self {
        Self { input }
    }

    /// Builds the report.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidData` if the input has no days, a day
    /// numbered 0, or the same day twice.
    pub fn generate(&self) -> Result<ProgressReport> {
        self.validate()?;
        let days = &self.input.days;

        let total_tasks: usize = days.iter().map(|d| d.tasks.len()).sum();
        let completed_tasks: usize = days.iter().map(DayInput::completed_tasks).sum();

        let summary = ProgressSummary {
            current_day: self.input.current_day,
            total_days: days.len(),
            completed_days: days.iter().filter(|d| d.is_complete()).count(),
            total_tasks,
            completed_tasks,
            remaining_tasks: total_tasks - completed_tasks,
            completion_percent: percent(completed_tasks, total_tasks),
            planned_minutes: days.iter().map(DayInput::planned_minutes).sum(),
            completed_minutes: days.iter().map(DayInput::completed_minutes).sum(),
        };

        Ok(ProgressReport {
            generated_at: self.input.generated_at,
            summary,
            weeks: self.week_rows(),
            days: days
                .iter()
                .map(|d| DayRow {
                    day: d.day,
                    theme: d.theme.clone(),
                    tasks: d.tasks.clone(),
                    complete: d.is_complete(),
                })
                .collect(),
            score_trend: self.score_trend(),
            weak_points: self.input.weak_points.clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.input.days.is_empty() {
            return Err(ReportError::InvalidData("no days to report".to_string()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for day in &self.input.days {
            if day.day == 0 {
                return Err(ReportError::InvalidData("day numbers start at 1".to_string()));
            }
            if !seen.insert(day.day) {
                return Err(ReportError::InvalidData(format!(
                    "day {} appears more than once",
                    day.day
                )));
            }
        }
        Ok(())
    }

    fn week_rows(&self) -> Vec<WeekRow> {
        let mut weeks: BTreeMap<u32, Vec<&DayInput>> = BTreeMap::new();
        for day in &self.input.days {
            weeks.entry(day.week).or_default().push(day);
        }

        weeks
            .into_iter()
            .map(|(week, days)| WeekRow {
                week,
                title: days
                    .first()
                    .map(|d| d.week_title.clone())
                    .unwrap_or_default(),
                total_tasks: days.iter().map(|d| d.tasks.len()).sum(),
                completed_tasks: days.iter().map(|d| d.completed_tasks()).sum(),
                total_days: days.len(),
                completed_days: days.iter().filter(|d| d.is_complete()).count(),
                planned_minutes: days.iter().map(|d| d.planned_minutes()).sum(),
            })
            .collect()
    }

    fn score_trend(&self) -> ScoreTrend {
        let samples = self.input.weekly_scores.clone();
        let change = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) if samples.len() > 1 => {
                Some(i64::from(last.score) - i64::from(first.score))
            }
            _ => None,
        };
        ScoreTrend { samples, change }
    }
}

/// `part` as a whole percentage of `whole`, rounded down.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    u32::try_from(part * 100 / whole).unwrap_or(100)
}
