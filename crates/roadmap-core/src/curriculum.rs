//! The fixed 21-day TOEIC curriculum.
//!
//! [`generate_curriculum`] is pure: every call builds the same three weeks of
//! themed days, each holding three tasks with literal durations.

use serde::{Deserialize, Serialize};

/// Number of days in the roadmap.
pub const TOTAL_DAYS: u32 = 21;

/// Number of days per week.
pub const DAYS_PER_WEEK: u32 = 7;

/// Number of weeks in the roadmap.
pub const TOTAL_WEEKS: u32 = TOTAL_DAYS / DAYS_PER_WEEK;

const WEEK_TITLES: [&str; 3] = ["1주차: 기초 체력", "2주차: 심화 적응", "3주차: 실전 스퍼트"];

const WEEK_ONE_THEMES: [&str; 7] = [
    "토익 기초: 품사론 & Part 1",
    "동사 파트 정복 & Part 2 (1)",
    "준동사 완벽 정리 & Part 2 (2)",
    "접속사/전치사 구별 & Part 5 속도",
    "명사/형용사 보어 & Part 1 빈출 표현",
    "Part 2 간접 응답 집중 훈련",
    "1주차 총정리 및 하프 모의고사",
];

const WEEK_TWO_THEMES: [&str; 7] = [
    "Part 3 대화 흐름 파악 & 패러프레이징",
    "Part 4 담화문 핵심 정보 찾기",
    "Part 6 문맥에 맞는 문장 삽입",
    "Part 3/4 시각 자료 연계 문제",
    "비즈니스 이메일/공고문 독해 전략",
    "LC 전체 파트 시간 관리 및 소거법",
    "2주차 중간 점검: LC/RC 하프 테스트",
];

const WEEK_THREE_THEMES: [&str; 7] = [
    "Part 7 이중 지문 연계 정보 찾기",
    "Part 7 삼중 지문 시간 단축 비법",
    "고난도 문법 총정리 (Part 5)",
    "실전 모의고사 1세트 & 오답 분석",
    "실전 모의고사 2세트 & 약점 보완",
    "최종 핵심 요약 및 빈출 함정 정리",
    "Final Check: 800점 돌파 최종 점검",
];

/// Kind of study activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Vocabulary memorization.
    Vocab,
    /// Grammar drill.
    Grammar,
    /// Listening comprehension.
    Lc,
    /// Reading comprehension.
    Rc,
    /// Timed mock exam.
    MockTest,
}

impl TaskKind {
    /// Returns the wire label of this kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Vocab => "VOCAB",
            Self::Grammar => "GRAMMAR",
            Self::Lc => "LC",
            Self::Rc => "RC",
            Self::MockTest => "MOCK_TEST",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One atomic study activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier, unique across the curriculum (`d{day}-{n}`).
    pub id: String,

    /// Activity kind.
    #[serde(rename = "type")]
    pub kind: TaskKind,

    /// Short title.
    pub title: String,

    /// One-line description.
    pub description: String,

    /// Whether the learner has completed the task.
    pub is_completed: bool,

    /// Estimated duration in minutes.
    pub duration: u32,
}

impl Task {
    fn new(
        day: u32,
        position: u32,
        kind: TaskKind,
        title: impl Into<String>,
        description: &str,
        duration: u32,
    ) -> Self {
        Self {
            id: format!("d{day}-{position}"),
            kind,
            title: title.into(),
            description: description.to_string(),
            is_completed: false,
            duration,
        }
    }
}

/// A themed day of the roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    /// 1-based day number.
    pub day: u32,

    /// Theme label.
    pub theme: String,

    /// Ordered tasks for the day.
    pub tasks: Vec<Task>,
}

impl DailyPlan {
    /// Sum of task durations in minutes.
    #[must_use]
    pub fn total_minutes(&self) -> u32 {
        self.tasks.iter().map(|t| t.duration).sum()
    }

    /// Number of completed tasks.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed).count()
    }

    /// Minutes of completed tasks.
    #[must_use]
    pub fn completed_minutes(&self) -> u32 {
        self.tasks
            .iter()
            .filter(|t| t.is_completed)
            .map(|t| t.duration)
            .sum()
    }

    /// Returns `true` when the day has tasks and all of them are completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.is_completed)
    }

    /// Week (1-based) this day belongs to.
    #[must_use]
    pub const fn week(&self) -> u32 {
        week_of(self.day)
    }
}

/// Returns the 1-based week number of a 1-based day.
#[must_use]
pub const fn week_of(day: u32) -> u32 {
    day.saturating_sub(1) / DAYS_PER_WEEK + 1
}

/// Returns the title of a 1-based week, if it exists.
#[must_use]
pub fn week_title(week: u32) -> Option<&'static str> {
    let index = usize::try_from(week.checked_sub(1)?).ok()?;
    WEEK_TITLES.get(index).copied()
}

/// Returns the day range covered by a 1-based week.
///
/// Saturates at `u32::MAX` for weeks far past the roadmap.
#[must_use]
pub const fn week_days(week: u32) -> std::ops::RangeInclusive<u32> {
    let start = week.saturating_sub(1).saturating_mul(DAYS_PER_WEEK).saturating_add(1);
    start..=start.saturating_add(DAYS_PER_WEEK - 1)
}

/// Builds the 21-day curriculum.
///
/// # Examples
///
/// ```
/// use roadmap_core::curriculum::generate_curriculum;
///
/// let plan = generate_curriculum();
/// assert_eq!(plan.len(), 21);
/// assert_eq!(plan[0].tasks[0].id, "d1-1");
/// ```
#[must_use]
pub fn generate_curriculum() -> Vec<DailyPlan> {
    (1..=TOTAL_DAYS).map(build_day).collect()
}

fn build_day(day: u32) -> DailyPlan {
    let even = day % 2 == 0;
    let (theme, tasks) = match week_of(day) {
        1 => (
            WEEK_ONE_THEMES[theme_index(day, 1)],
            vec![
                Task::new(
                    day,
                    1,
                    TaskKind::Vocab,
                    format!("필수 비즈니스 어휘 {day}"),
                    "사무 환경 및 일상 업무 관련 빈출 단어",
                    30,
                ),
                Task::new(
                    day,
                    2,
                    if even { TaskKind::Grammar } else { TaskKind::Rc },
                    format!("핵심 문법/독해 Day {day}"),
                    "수능 지식을 토익 포인트로 전환",
                    60,
                ),
                Task::new(
                    day,
                    3,
                    TaskKind::Lc,
                    format!("LC 집중 공략 Day {day}"),
                    "Part 1, 2 오답 소거법 연습",
                    40,
                ),
            ],
        ),
        2 => (
            WEEK_TWO_THEMES[theme_index(day, 2)],
            vec![
                Task::new(
                    day,
                    1,
                    TaskKind::Vocab,
                    format!("심화 비즈니스 어휘 {day}"),
                    "동의어 및 다의어 위주 암기",
                    30,
                ),
                Task::new(
                    day,
                    2,
                    TaskKind::Lc,
                    "LC 중장문 집중 청취",
                    "화자의 의도와 숨은 의미 파악",
                    50,
                ),
                Task::new(
                    day,
                    3,
                    TaskKind::Rc,
                    "RC 지문 독해 속도 향상",
                    "지문당 1분 컷 전략",
                    60,
                ),
            ],
        ),
        _ => (
            WEEK_THREE_THEMES[theme_index(day, 3)],
            vec![
                Task::new(
                    day,
                    1,
                    TaskKind::MockTest,
                    if even { "실전 모의고사" } else { "하프 테스트" },
                    "마킹 연습 및 실전 시간 배분",
                    120,
                ),
                Task::new(
                    day,
                    2,
                    TaskKind::Vocab,
                    "적중 예상 어휘 80",
                    "최신 출제 경향 반영 어휘",
                    20,
                ),
                Task::new(
                    day,
                    3,
                    TaskKind::Rc,
                    "최종 오답 노트 정리",
                    "틀린 유형 반복 학습",
                    40,
                ),
            ],
        ),
    };

    DailyPlan {
        day,
        theme: theme.to_string(),
        tasks,
    }
}

/// Position of a day inside its week's theme list.
const fn theme_index(day: u32, week: u32) -> usize {
    ((day - (week - 1) * DAYS_PER_WEEK - 1) % DAYS_PER_WEEK) as usize
}
