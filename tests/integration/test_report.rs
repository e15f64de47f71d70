//! Integration tests for curriculum progress flowing into reports.

use roadmap_core::{report_input, TaskStore};
use roadmap_report::{json::JsonGenerator, MarkdownGenerator, ReportGenerator};

#[test]
fn test_fresh_roadmap_report() {
    let store = TaskStore::new();
    let report = ReportGenerator::new(&report_input(&store))
        .generate()
        .expect("report should generate");

    assert_eq!(report.summary.total_days, 21);
    assert_eq!(report.summary.total_tasks, 63);
    assert_eq!(report.summary.completed_tasks, 0);
    assert_eq!(report.summary.completion_percent, 0);
    assert_eq!(report.weeks.len(), 3);
    assert_eq!(report.score_trend.change, Some(130));
}

#[test]
fn test_completed_week_one_day_shows_in_markdown() {
    let mut store = TaskStore::new();
    for id in ["d1-1", "d1-2", "d1-3", "d2-1"] {
        assert!(store.toggle(id).found());
    }
    assert!(store.select_day(2).is_some());

    let report = ReportGenerator::new(&report_input(&store))
        .generate()
        .expect("report should generate");
    assert_eq!(report.summary.current_day, 2);
    assert_eq!(report.summary.completed_tasks, 4);
    assert_eq!(report.summary.completed_days, 1);
    assert_eq!(report.weeks[0].completed_tasks, 4);

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("| Current Day | Day 2 / 21 |"));
    assert!(markdown.contains("| Tasks Completed | 4 / 63 (6%) |"));
    assert!(markdown.contains("### Day 1: 토익 기초: 품사론 & Part 1 ✅"));
    assert!(markdown.contains("| 1 | 1주차: 기초 체력 | 4/21 | 1/7 |"));
}

#[test]
fn test_json_report_matches_store_totals() {
    let mut store = TaskStore::new();
    store.toggle("d21-1");

    let report = ReportGenerator::new(&report_input(&store))
        .generate()
        .expect("report should generate");
    let json = JsonGenerator::new(&report).generate().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(value["summary"]["completedTasks"], store.completed_count());
    assert_eq!(value["summary"]["remainingTasks"], store.remaining());
    assert_eq!(value["weeks"][2]["title"], "3주차: 실전 스퍼트");
    assert_eq!(value["days"][20]["tasks"][0]["kind"], "MOCK_TEST");
}
