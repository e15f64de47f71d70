//! Roadmap Core
//!
//! Generates the 21-day TOEIC curriculum, tracks task completion, runs study
//! sessions, and talks to the generative-language service for tutor replies
//! and study content.

pub mod api;
pub mod config;
pub mod content;
pub mod curriculum;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod report;
pub mod session;
pub mod store;

pub use api::{
    create_router, AnswerRequest, AppState, CloseSessionResponse, CompleteSessionResponse,
    ErrorResponse, OpenSessionRequest, OpenSessionResponse, StatsResponse, ToggleResponse,
    TutorRequest, TutorResponse,
};
pub use config::{Config, FALLBACK_API_KEY_ENV};
pub use content::{
    ContentPlan, ContentRequest, ExampleSentence, GeneratedContent, QuizItem, QUIZ_OPTION_COUNT,
};
pub use curriculum::{
    generate_curriculum, week_days, week_of, week_title, DailyPlan, Task, TaskKind, DAYS_PER_WEEK,
    TOTAL_DAYS, TOTAL_WEEKS,
};
pub use error::{LlmErrorKind, PlannerError, Result};
pub use gateway::{
    ContentGateway, GenerativeModel, ModelRequest, EMPTY_REPLY_FALLBACK, TUTOR_FALLBACK,
};
pub use gemini::GeminiClient;
pub use report::report_input;
pub use session::{
    AdvanceOutcome, AnswerFeedback, CompletionOutcome, OpenOutcome, SessionPhase, SessionView,
    StudySession, StudySessions,
};
pub use store::{count_completed, ScoreSample, TaskStore, ToggleOutcome, UserStats, WeekSummary};
