//! Study session controller.
//!
//! At most one study session exists at a time. Opening a session starts one
//! content generation on the runtime; while it is in flight further opens are
//! ignored. Closing aborts the generation, and a result arriving for a session
//! that is no longer current is discarded.
//!
//! Session lifecycle:
//! - `Loading` -> `Ready` (content generated) -> quiz flow -> finished -> completed
//! - `Loading` -> `Unavailable` (generation failed)
//! - any phase -> closed

use std::sync::Arc;

use futures::future::{AbortHandle, Abortable, Aborted};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::content::{ContentRequest, GeneratedContent, QuizItem};
use crate::curriculum::{Task, TaskKind};
use crate::error::{PlannerError, Result};
use crate::gateway::ContentGateway;
use crate::store::TaskStore;

// ============================================================================
// Session state
// ============================================================================

/// Phase of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Content generation is in flight.
    Loading,
    /// Content is available; the quiz can be taken.
    Ready,
    /// Generation failed; the session only shows an error.
    Unavailable,
}

/// Feedback for one answered quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    /// Whether the selected option is correct.
    pub correct: bool,
    /// The selected option.
    pub selected: usize,
    /// The correct option.
    pub answer: usize,
    /// Explanation of the correct answer.
    pub explanation: String,
    /// `true` if this was the last quiz item.
    pub is_last: bool,
}

/// Result of advancing the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOutcome {
    /// `true` once every quiz item has been answered.
    pub finished: bool,
    /// Index of the quiz item now shown.
    pub current_index: usize,
}

/// Result of completing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    /// The studied task.
    pub task_id: String,
    /// `false` if the task was already complete and left untouched.
    pub toggled: bool,
    /// Aggregate completed count afterwards.
    pub total_completed: usize,
}

/// What [`StudySessions::open`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpenOutcome {
    /// A new session was opened and generation started.
    Started {
        /// Id of the new session.
        session_id: u64,
    },
    /// A generation was already in flight; nothing changed.
    Ignored,
}

impl OpenOutcome {
    /// Returns `true` if a session was started.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// Serializable snapshot of the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session id.
    pub id: u64,
    /// Studied task id.
    pub task_id: String,
    /// Studied task title.
    pub task_title: String,
    /// Studied task category.
    pub task_kind: TaskKind,
    /// Planned minutes.
    pub duration: u32,
    /// Current phase.
    pub phase: SessionPhase,
    /// Generated content, once ready.
    pub content: Option<GeneratedContent>,
    /// Index of the quiz item shown.
    pub current_index: usize,
    /// Number of quiz items.
    pub quiz_count: usize,
    /// Option chosen for the current item, if answered.
    pub selected_option: Option<usize>,
    /// Correct answers so far.
    pub correct_count: usize,
    /// `true` once every quiz item has been answered.
    pub finished: bool,
    /// Quiz progress, 0 to 100.
    pub progress_percent: u32,
}

/// One study session over a task.
#[derive(Debug, Clone)]
pub struct StudySession {
    id: u64,
    task: Task,
    phase: SessionPhase,
    content: Option<GeneratedContent>,
    current_index: usize,
    selected: Option<usize>,
    correct: usize,
    finished: bool,
}

impl StudySession {
    fn loading(id: u64, task: Task) -> Self {
        Self {
            id,
            task,
            phase: SessionPhase::Loading,
            content: None,
            current_index: 0,
            selected: None,
            correct: 0,
            finished: false,
        }
    }

    fn resolve(&mut self, content: Option<GeneratedContent>) {
        self.phase = if content.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Unavailable
        };
        self.content = content;
    }

    /// Session id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The studied task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// `true` once every quiz item has been answered.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Correct answers so far.
    #[must_use]
    pub const fn correct_count(&self) -> usize {
        self.correct
    }

    /// The quiz item currently shown, if any.
    #[must_use]
    pub fn current_quiz(&self) -> Option<&QuizItem> {
        if self.finished {
            return None;
        }
        self.content.as_ref()?.quizzes.get(self.current_index)
    }

    fn quizzes(&self) -> Result<&[QuizItem]> {
        match (self.phase, &self.content) {
            (SessionPhase::Ready, Some(content)) => Ok(&content.quizzes),
            (SessionPhase::Loading, _) => Err(PlannerError::session_conflict(
                "study content is still loading",
            )),
            _ => Err(PlannerError::session_conflict("study content is unavailable")),
        }
    }

    /// Answers the current quiz item. Each item can be answered once.
    pub fn select_option(&mut self, option: usize) -> Result<AnswerFeedback> {
        if self.finished {
            return Err(PlannerError::session_conflict("quiz is already finished"));
        }
        if self.selected.is_some() {
            return Err(PlannerError::session_conflict("quiz item already answered"));
        }

        let quizzes = self.quizzes()?;
        let is_last = self.current_index + 1 >= quizzes.len();
        let quiz = quizzes
            .get(self.current_index)
            .ok_or_else(|| PlannerError::session_conflict("no quiz item to answer"))?;
        if option >= quiz.options.len() {
            return Err(PlannerError::InvalidAnswer {
                option,
                count: quiz.options.len(),
            });
        }

        let feedback = AnswerFeedback {
            correct: quiz.is_correct(option),
            selected: option,
            answer: quiz.answer,
            explanation: quiz.explanation.clone(),
            is_last,
        };

        self.selected = Some(option);
        if feedback.correct {
            self.correct += 1;
        }
        Ok(feedback)
    }

    /// Moves to the next quiz item, or finishes after the last one.
    ///
    /// The current item must be answered first. Advancing a finished quiz is a no-op.
    pub fn advance(&mut self) -> Result<AdvanceOutcome> {
        let count = self.quizzes()?.len();
        if !self.finished {
            if self.selected.is_none() {
                return Err(PlannerError::session_conflict(
                    "answer the current quiz item first",
                ));
            }
            if self.current_index + 1 < count {
                self.current_index += 1;
                self.selected = None;
            } else {
                self.finished = true;
            }
        }
        Ok(AdvanceOutcome {
            finished: self.finished,
            current_index: self.current_index,
        })
    }

    /// Quiz progress as a percentage, counting the current item once answered.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let total = self.content.as_ref().map_or(0, |c| c.quizzes.len());
        if total == 0 {
            return 0;
        }
        if self.finished {
            return 100;
        }
        let done = self.current_index + usize::from(self.selected.is_some());
        u32::try_from(done * 100 / total).unwrap_or(100)
    }

    /// Serializable snapshot.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            task_id: self.task.id.clone(),
            task_title: self.task.title.clone(),
            task_kind: self.task.kind,
            duration: self.task.duration,
            phase: self.phase,
            content: self.content.clone(),
            current_index: self.current_index,
            quiz_count: self.content.as_ref().map_or(0, |c| c.quizzes.len()),
            selected_option: self.selected,
            correct_count: self.correct,
            finished: self.finished,
            progress_percent: self.progress_percent(),
        }
    }
}

// ============================================================================
// StudySessions
// ============================================================================

#[derive(Debug, Default)]
struct SessionSlot {
    next_id: u64,
    current: Option<StudySession>,
    in_flight: Option<(u64, AbortHandle)>,
}

impl SessionSlot {
    fn apply(&mut self, id: u64, content: Option<GeneratedContent>) {
        if matches!(self.in_flight, Some((flight, _)) if flight == id) {
            self.in_flight = None;
        }
        match self.current.as_mut() {
            Some(session) if session.id == id => {
                session.resolve(content);
                info!(session_id = id, phase = ?session.phase, "Study content settled");
            }
            _ => debug!(session_id = id, "Discarding study content for a closed session"),
        }
    }

    fn current_mut(&mut self) -> Result<&mut StudySession> {
        self.current.as_mut().ok_or(PlannerError::NoActiveSession)
    }
}

/// Owner of the single study session.
///
/// Cheap to clone; clones share the same slot.
#[derive(Debug, Clone)]
pub struct StudySessions {
    gateway: ContentGateway,
    slot: Arc<Mutex<SessionSlot>>,
}

impl StudySessions {
    /// Creates a controller generating content through `gateway`.
    #[must_use]
    pub fn new(gateway: ContentGateway) -> Self {
        Self {
            gateway,
            slot: Arc::new(Mutex::new(SessionSlot::default())),
        }
    }

    /// Opens a session for `task` and starts generating its content.
    ///
    /// Ignored while a previous generation is still in flight. Must be called
    /// from within a tokio runtime.
    pub async fn open(&self, task: Task) -> OpenOutcome {
        let mut slot = self.slot.lock().await;
        if let Some((in_flight, _)) = &slot.in_flight {
            debug!(in_flight, task_id = %task.id, "Open ignored: generation in flight");
            return OpenOutcome::Ignored;
        }

        slot.next_id += 1;
        let id = slot.next_id;
        let request = ContentRequest::for_task(&task);
        let (handle, registration) = AbortHandle::new_pair();

        info!(
            session_id = id,
            task_id = %task.id,
            duration = task.duration,
            "Study session opened"
        );
        slot.current = Some(StudySession::loading(id, task));
        slot.in_flight = Some((id, handle));
        drop(slot);

        let gateway = self.gateway.clone();
        let shared = Arc::clone(&self.slot);
        tokio::spawn(async move {
            let generation = Abortable::new(
                async move { gateway.study_content(&request).await },
                registration,
            );
            match generation.await {
                Ok(content) => shared.lock().await.apply(id, content),
                Err(Aborted) => debug!(session_id = id, "Study content generation aborted"),
            }
        });

        OpenOutcome::Started { session_id: id }
    }

    /// Closes the current session, aborting its generation if still in flight.
    ///
    /// Returns `true` if a session was open.
    pub async fn close(&self) -> bool {
        let mut slot = self.slot.lock().await;
        if let Some((id, handle)) = slot.in_flight.take() {
            handle.abort();
            debug!(session_id = id, "Aborted in-flight generation");
        }
        let closed = slot.current.take();
        if let Some(session) = &closed {
            info!(session_id = session.id, "Study session closed");
        }
        closed.is_some()
    }

    /// Snapshot of the current session.
    pub async fn current(&self) -> Option<SessionView> {
        self.slot.lock().await.current.as_ref().map(StudySession::view)
    }

    /// Returns `true` while a generation is in flight.
    pub async fn is_generating(&self) -> bool {
        self.slot.lock().await.in_flight.is_some()
    }

    /// Answers the current quiz item.
    pub async fn answer(&self, option: usize) -> Result<AnswerFeedback> {
        let mut slot = self.slot.lock().await;
        let session = slot.current_mut()?;
        let feedback = session.select_option(option)?;
        debug!(session_id = session.id, option, correct = feedback.correct, "Quiz item answered");
        Ok(feedback)
    }

    /// Advances the quiz.
    pub async fn advance(&self) -> Result<AdvanceOutcome> {
        self.slot.lock().await.current_mut()?.advance()
    }

    /// Marks the studied task complete and closes the session.
    ///
    /// The quiz must be finished. A task that is already complete is left as is.
    pub async fn complete(&self, store: &mut TaskStore) -> Result<CompletionOutcome> {
        let mut slot = self.slot.lock().await;
        let session = slot.current_mut()?;
        if !session.finished {
            return Err(PlannerError::session_conflict("quiz is not finished"));
        }

        let task_id = session.task.id.clone();
        let already_complete = store
            .find_task(&task_id)
            .is_some_and(|task| task.is_completed);
        let toggled = !already_complete && store.toggle(&task_id).found();

        info!(
            session_id = session.id,
            task_id = %task_id,
            toggled,
            correct = session.correct,
            "Study session completed"
        );
        slot.current = None;

        Ok(CompletionOutcome {
            task_id,
            toggled,
            total_completed: store.completed_count(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use super::*;
    use crate::config::Config;
    use crate::error::LlmErrorKind;
    use crate::gateway::test_support::{content_reply, ScriptedModel};

    fn sessions(model: Arc<ScriptedModel>) -> StudySessions {
        StudySessions::new(ContentGateway::new(model, &Config::default()))
    }

    fn task(store: &TaskStore, id: &str) -> Task {
        store.find_task(id).unwrap().clone()
    }

    async fn settled(sessions: &StudySessions) -> SessionView {
        for _ in 0..200 {
            if let Some(view) = sessions
                .current()
                .await
                .filter(|view| view.phase != SessionPhase::Loading)
            {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        sessions.current().await.unwrap()
    }

    async fn wait_for_requests(model: &ScriptedModel, count: usize) {
        for _ in 0..200 {
            if model.request_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_open_generates_content_and_becomes_ready() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(content_reply(2))]));
        let sessions = sessions(Arc::clone(&model));
        let store = TaskStore::new();

        let outcome = sessions.open(task(&store, "d1-2")).await;
        assert_eq!(outcome, OpenOutcome::Started { session_id: 1 });

        let view = settled(&sessions).await;
        assert_eq!(view.phase, SessionPhase::Ready);
        assert_eq!(view.task_id, "d1-2");
        assert_eq!(view.quiz_count, 2);
        assert_eq!(view.progress_percent, 0);
        assert!(!sessions.is_generating().await);

        // the task's 60 minutes size the request
        let requests = model.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("관련 퀴즈 8문제"));
    }

    #[tokio::test]
    async fn test_quiz_flow_and_completion() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(content_reply(2))]));
        let sessions = sessions(model);
        let mut store = TaskStore::new();

        sessions.open(task(&store, "d1-1")).await;
        settled(&sessions).await;

        // quiz 0 answer is 0, quiz 1 answer is 1
        let feedback = sessions.answer(0).await.unwrap();
        assert!(feedback.correct);
        assert!(!feedback.is_last);
        assert_eq!(feedback.explanation, "Explanation 0");
        assert_eq!(sessions.current().await.unwrap().progress_percent, 50);

        let err = sessions.answer(1).await.unwrap_err();
        assert!(matches!(err, PlannerError::SessionConflict { .. }));

        let next = sessions.advance().await.unwrap();
        assert_eq!(next, AdvanceOutcome { finished: false, current_index: 1 });

        let feedback = sessions.answer(3).await.unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.answer, 1);
        assert!(feedback.is_last);

        let err = sessions.complete(&mut store).await.unwrap_err();
        assert!(matches!(err, PlannerError::SessionConflict { .. }));

        let done = sessions.advance().await.unwrap();
        assert!(done.finished);
        let view = sessions.current().await.unwrap();
        assert_eq!(view.progress_percent, 100);
        assert_eq!(view.correct_count, 1);

        let outcome = sessions.complete(&mut store).await.unwrap();
        assert_eq!(outcome.task_id, "d1-1");
        assert!(outcome.toggled);
        assert_eq!(outcome.total_completed, 1);
        assert!(store.find_task("d1-1").unwrap().is_completed);
        assert!(sessions.current().await.is_none());
    }

    #[tokio::test]
    async fn test_complete_leaves_completed_task_complete() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(content_reply(1))]));
        let sessions = sessions(model);
        let mut store = TaskStore::new();
        store.toggle("d2-3");

        sessions.open(task(&store, "d2-3")).await;
        settled(&sessions).await;
        sessions.answer(0).await.unwrap();
        sessions.advance().await.unwrap();

        let outcome = sessions.complete(&mut store).await.unwrap();
        assert!(!outcome.toggled);
        assert!(store.find_task("d2-3").unwrap().is_completed);
        assert_eq!(store.completed_count(), 1);
    }

    #[tokio::test]
    async fn test_answer_out_of_range_option() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(content_reply(1))]));
        let sessions = sessions(model);
        let store = TaskStore::new();

        sessions.open(task(&store, "d1-1")).await;
        settled(&sessions).await;

        let err = sessions.answer(4).await.unwrap_err();
        assert!(matches!(err, PlannerError::InvalidAnswer { option: 4, count: 4 }));
        // still answerable
        assert!(sessions.answer(0).await.is_ok());
    }

    #[tokio::test]
    async fn test_advance_requires_answer() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(content_reply(2))]));
        let sessions = sessions(model);
        let store = TaskStore::new();

        sessions.open(task(&store, "d1-1")).await;
        settled(&sessions).await;

        assert!(matches!(
            sessions.advance().await,
            Err(PlannerError::SessionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_generation_is_unavailable() {
        let model = Arc::new(ScriptedModel::new(vec![Err(PlannerError::llm_api_error(
            LlmErrorKind::Server,
            "503",
        ))]));
        let sessions = sessions(model);
        let store = TaskStore::new();

        sessions.open(task(&store, "d3-1")).await;
        let view = settled(&sessions).await;
        assert_eq!(view.phase, SessionPhase::Unavailable);
        assert!(view.content.is_none());

        assert!(matches!(
            sessions.answer(0).await,
            Err(PlannerError::SessionConflict { .. })
        ));
        assert!(sessions.close().await);
    }

    #[tokio::test]
    async fn test_open_while_generating_is_ignored() {
        let gate = Arc::new(Semaphore::new(0));
        let model = Arc::new(ScriptedModel::gated(
            vec![Ok(content_reply(1)), Ok(content_reply(1))],
            Arc::clone(&gate),
        ));
        let sessions = sessions(Arc::clone(&model));
        let store = TaskStore::new();

        assert!(sessions.open(task(&store, "d1-1")).await.is_started());
        wait_for_requests(&model, 1).await;

        assert_eq!(sessions.open(task(&store, "d1-2")).await, OpenOutcome::Ignored);
        assert_eq!(sessions.current().await.unwrap().task_id, "d1-1");

        gate.add_permits(1);
        let view = settled(&sessions).await;
        assert_eq!(view.phase, SessionPhase::Ready);
        assert_eq!(view.task_id, "d1-1");
        assert_eq!(model.request_count(), 1);
    }

    #[tokio::test]
    async fn test_close_aborts_generation() {
        let gate = Arc::new(Semaphore::new(0));
        let model = Arc::new(ScriptedModel::gated(vec![Ok(content_reply(1))], Arc::clone(&gate)));
        let sessions = sessions(Arc::clone(&model));
        let store = TaskStore::new();

        sessions.open(task(&store, "d1-1")).await;
        wait_for_requests(&model, 1).await;

        assert!(sessions.close().await);
        assert!(!sessions.is_generating().await);

        gate.add_permits(1);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(model.finished(), 0);
        assert!(sessions.current().await.is_none());
    }

    #[tokio::test]
    async fn test_reopen_after_close_gets_new_id() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(content_reply(1)), Ok(content_reply(1))]));
        let sessions = sessions(model);
        let store = TaskStore::new();

        sessions.open(task(&store, "d1-1")).await;
        settled(&sessions).await;
        sessions.close().await;

        let outcome = sessions.open(task(&store, "d1-3")).await;
        assert_eq!(outcome, OpenOutcome::Started { session_id: 2 });
        let view = settled(&sessions).await;
        assert_eq!(view.id, 2);
        assert_eq!(view.task_id, "d1-3");
    }

    #[tokio::test]
    async fn test_operations_without_session() {
        let sessions = sessions(Arc::new(ScriptedModel::default()));
        let mut store = TaskStore::new();

        assert!(!sessions.close().await);
        assert!(matches!(sessions.answer(0).await, Err(PlannerError::NoActiveSession)));
        assert!(matches!(sessions.advance().await, Err(PlannerError::NoActiveSession)));
        assert!(matches!(
            sessions.complete(&mut store).await,
            Err(PlannerError::NoActiveSession)
        ));
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let store = TaskStore::new();
        let mut slot = SessionSlot {
            next_id: 2,
            current: Some(StudySession::loading(2, task(&store, "d1-1"))),
            in_flight: None,
        };
        slot.apply(1, None);
        assert_eq!(slot.current.as_ref().unwrap().phase(), SessionPhase::Loading);
    }

    #[test]
    fn test_open_outcome_serialization() {
        let json = serde_json::to_value(OpenOutcome::Started { session_id: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "started", "session_id": 3 }));
    }
}
