//! In-memory task completion state.
//!
//! [`TaskStore`] owns the curriculum and is the only place completion flags
//! change. Every [`TaskStore::toggle`] recounts completed tasks from scratch,
//! so [`UserStats::total_completed_tasks`] always equals the number of set
//! flags.

use serde::{Deserialize, Serialize};

use crate::curriculum::{generate_curriculum, week_days, week_title, DailyPlan, Task, TOTAL_WEEKS};

// ============================================================================
// UserStats
// ============================================================================

/// A weekly mock-score sample shown on the trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSample {
    /// Week label (e.g. `W1`).
    pub label: String,
    /// Estimated TOEIC score.
    pub score: u32,
}

impl ScoreSample {
    /// Creates a new sample.
    #[must_use]
    pub fn new(label: impl Into<String>, score: u32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Learner statistics shown by the stats view.
///
/// Only `total_completed_tasks` is derived; the rest are seed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Day currently selected in the planner.
    pub current_day: u32,
    /// Completed tasks across all days.
    pub total_completed_tasks: usize,
    /// Weekly score trend.
    pub weekly_progress: Vec<ScoreSample>,
    /// Weak areas to focus on.
    pub weak_points: Vec<String>,
}

impl UserStats {
    /// Returns the seed statistics for a fresh learner.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            current_day: 1,
            total_completed_tasks: 0,
            weekly_progress: vec![
                ScoreSample::new("W1", 650),
                ScoreSample::new("W2", 720),
                ScoreSample::new("W3", 780),
            ],
            weak_points: vec![
                "Part 5 전치사/접속사".to_string(),
                "Part 7 다중 지문 연계".to_string(),
                "LC Part 2 우회적 응답".to_string(),
            ],
        }
    }
}

impl Default for UserStats {
    fn default() -> Self {
        Self::initial()
    }
}

// ============================================================================
// Toggle outcome and week summaries
// ============================================================================

/// Result of a [`TaskStore::toggle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    /// Number of tasks whose flag flipped (0 for an unknown id).
    pub matched: usize,
    /// New flag of the last matched task, if any matched.
    pub completed: Option<bool>,
    /// Aggregate completed count after the toggle.
    pub total_completed: usize,
}

impl ToggleOutcome {
    /// Returns `true` if at least one task matched the id.
    #[must_use]
    pub const fn found(&self) -> bool {
        self.matched > 0
    }
}

/// Completion summary for one week of the roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    /// 1-based week number.
    pub week: u32,
    /// Week title.
    pub title: String,
    /// Days belonging to the week.
    pub days: Vec<u32>,
    /// Planned minutes across the week.
    pub total_minutes: u32,
    /// Tasks in the week.
    pub total_tasks: usize,
    /// Completed tasks in the week.
    pub completed_tasks: usize,
    /// Days with every task completed.
    pub completed_days: usize,
}

// ============================================================================
// TaskStore
// ============================================================================

/// Owner of the curriculum's completion flags.
#[derive(Debug, Clone)]
pub struct TaskStore {
    plans: Vec<DailyPlan>,
    stats: UserStats,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates a store over the generated 21-day curriculum.
    ///
    /// # Examples
    ///
    /// ```
    /// use roadmap_core::TaskStore;
    ///
    /// let mut store = TaskStore::new();
    /// assert_eq!(store.total_tasks(), 63);
    ///
    /// store.toggle("d1-1");
    /// assert_eq!(store.completed_count(), 1);
    /// store.toggle("d1-1");
    /// assert_eq!(store.completed_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::from_plans(generate_curriculum())
    }

    /// Creates a store over an arbitrary set of days.
    ///
    /// Flags already set in `plans` are counted immediately.
    #[must_use]
    pub fn from_plans(plans: Vec<DailyPlan>) -> Self {
        let mut store = Self {
            plans,
            stats: UserStats::initial(),
        };
        store.recount();
        store
    }

    /// Flips the completion flag of every task whose id equals `task_id`.
    ///
    /// Unknown ids are ignored. The aggregate is recomputed either way.
    pub fn toggle(&mut self, task_id: &str) -> ToggleOutcome {
        let mut matched = 0;
        let mut completed = None;

        for task in self
            .plans
            .iter_mut()
            .flat_map(|plan| plan.tasks.iter_mut())
            .filter(|task| task.id == task_id)
        {
            task.is_completed = !task.is_completed;
            completed = Some(task.is_completed);
            matched += 1;
        }

        self.recount();

        if matched == 0 {
            tracing::debug!(task_id, "Toggle ignored: unknown task id");
        } else {
            tracing::debug!(
                task_id,
                completed = ?completed,
                total_completed = self.stats.total_completed_tasks,
                "Task toggled"
            );
        }

        ToggleOutcome {
            matched,
            completed,
            total_completed: self.stats.total_completed_tasks,
        }
    }

    fn recount(&mut self) {
        self.stats.total_completed_tasks = count_completed(&self.plans);
    }

    /// Selects the day shown by the planner.
    ///
    /// Unknown days fall back to the first day. Returns the selected plan.
    pub fn select_day(&mut self, day: u32) -> Option<&DailyPlan> {
        let selected = if self.day(day).is_some() {
            day
        } else {
            self.plans.first()?.day
        };
        self.stats.current_day = selected;
        self.day(selected)
    }

    /// All days in order.
    #[must_use]
    pub fn plans(&self) -> &[DailyPlan] {
        &self.plans
    }

    /// Looks up a day by its 1-based number.
    #[must_use]
    pub fn day(&self, day: u32) -> Option<&DailyPlan> {
        self.plans.iter().find(|plan| plan.day == day)
    }

    /// Looks up a task by exact id.
    #[must_use]
    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.plans
            .iter()
            .flat_map(|plan| plan.tasks.iter())
            .find(|task| task.id == task_id)
    }

    /// Current statistics.
    #[must_use]
    pub const fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// Aggregate completed count.
    #[must_use]
    pub const fn completed_count(&self) -> usize {
        self.stats.total_completed_tasks
    }

    /// Number of tasks across all days.
    #[must_use]
    pub fn total_tasks(&self) -> usize {
        self.plans.iter().map(|plan| plan.tasks.len()).sum()
    }

    /// Tasks still to be completed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total_tasks().saturating_sub(self.completed_count())
    }

    /// Per-week completion summaries.
    #[must_use]
    pub fn week_summaries(&self) -> Vec<WeekSummary> {
        (1..=TOTAL_WEEKS)
            .map(|week| {
                let range = week_days(week);
                let days: Vec<&DailyPlan> = self
                    .plans
                    .iter()
                    .filter(|plan| range.contains(&plan.day))
                    .collect();
                WeekSummary {
                    week,
                    title: week_title(week).unwrap_or_default().to_string(),
                    days: days.iter().map(|plan| plan.day).collect(),
                    total_minutes: days.iter().map(|plan| plan.total_minutes()).sum(),
                    total_tasks: days.iter().map(|plan| plan.tasks.len()).sum(),
                    completed_tasks: days.iter().map(|plan| plan.completed_count()).sum(),
                    completed_days: days.iter().filter(|plan| plan.is_complete()).count(),
                }
            })
            .collect()
    }
}

/// Counts completed tasks across `plans`.
#[must_use]
pub fn count_completed(plans: &[DailyPlan]) -> usize {
    plans.iter().map(DailyPlan::completed_count).sum()
}
