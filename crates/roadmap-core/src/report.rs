//! Snapshot of the task store for progress reports.

use roadmap_report::{DayInput, ReportInput, ScoreInput, TaskInput};

use crate::curriculum::{week_title, DailyPlan, Task};
use crate::store::TaskStore;

/// Converts the store into the report crate's input snapshot.
///
/// The generation timestamp is left at its default (now).
#[must_use]
pub fn report_input(store: &TaskStore) -> ReportInput {
    let stats = store.stats();
    ReportInput {
        current_day: stats.current_day,
        days: store.plans().iter().map(day_input).collect(),
        weekly_scores: stats
            .weekly_progress
            .iter()
            .map(|sample| ScoreInput {
                label: sample.label.clone(),
                score: sample.score,
            })
            .collect(),
        weak_points: stats.weak_points.clone(),
        ..ReportInput::default()
    }
}

fn day_input(plan: &DailyPlan) -> DayInput {
    DayInput {
        day: plan.day,
        week: plan.week(),
        week_title: week_title(plan.week()).unwrap_or_default().to_string(),
        theme: plan.theme.clone(),
        tasks: plan.tasks.iter().map(task_input).collect(),
    }
}

fn task_input(task: &Task) -> TaskInput {
    TaskInput {
        id: task.id.clone(),
        kind: task.kind.to_string(),
        title: task.title.clone(),
        duration: task.duration,
        completed: task.is_completed,
    }
}
