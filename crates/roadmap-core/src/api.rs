//! HTTP API for the study planner.
//!
//! # Endpoints
//!
//! - `GET /api/curriculum` - All 21 days
//! - `GET /api/curriculum/:day` - One day
//! - `GET /api/weeks` - Per-week completion summaries
//! - `POST /api/tasks/:id/toggle` - Flip a task's completion flag
//! - `GET /api/stats` - Learner statistics
//! - `POST /api/days/:day/select` - Select the current day
//! - `POST /api/tutor` - Ask the AI tutor
//! - `POST /api/session` - Open a study session for a task
//! - `GET /api/session` - Current study session
//! - `DELETE /api/session` - Close the study session
//! - `POST /api/session/answer` - Answer the current quiz item
//! - `POST /api/session/next` - Advance the quiz
//! - `POST /api/session/complete` - Complete the studied task
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use roadmap_core::{create_router, AppState, Config, GeminiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let model = Arc::new(GeminiClient::from_env(&config)?);
//! let router = create_router(AppState::new(config, model));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::curriculum::DailyPlan;
use crate::error::PlannerError;
use crate::gateway::{ContentGateway, GenerativeModel};
use crate::session::{AdvanceOutcome, AnswerFeedback, SessionView, StudySessions};
use crate::store::{TaskStore, UserStats, WeekSummary};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response body for the toggle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    /// Whether any task matched the id.
    pub found: bool,
    /// New completion flag, if a task matched.
    pub completed: Option<bool>,
    /// Aggregate completed count after the toggle.
    pub total_completed: usize,
}

/// Response body for the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Learner statistics.
    #[serde(flatten)]
    pub stats: UserStats,
    /// Tasks across the roadmap.
    pub total_tasks: usize,
    /// Tasks still to complete.
    pub remaining: usize,
}

impl StatsResponse {
    fn from_store(store: &TaskStore) -> Self {
        Self {
            stats: store.stats().clone(),
            total_tasks: store.total_tasks(),
            remaining: store.remaining(),
        }
    }
}

/// Request body for the tutor endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TutorRequest {
    /// The learner's question.
    pub question: String,
    /// Session-context label; the configured default when absent.
    #[serde(default)]
    pub context: Option<String>,
}

/// Response body for the tutor endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorResponse {
    /// Tutor reply, or a fallback message.
    pub reply: String,
}

/// Request body for opening a study session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// Task to study.
    pub task_id: String,
}

/// Response body for opening a study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionResponse {
    /// `false` when a generation was already in flight.
    pub accepted: bool,
    /// The current session.
    pub session: Option<SessionView>,
}

/// Response body for closing the study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSessionResponse {
    /// Whether a session was open.
    pub closed: bool,
}

/// Request body for answering a quiz item.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    /// Zero-based option index.
    pub option: usize,
}

/// Response body for completing a study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionResponse {
    /// The studied task.
    pub task_id: String,
    /// `false` if the task was already complete.
    pub toggled: bool,
    /// Statistics after completion.
    pub stats: StatsResponse,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Planner configuration.
    pub config: Config,
    /// Curriculum and completion flags.
    pub store: Arc<Mutex<TaskStore>>,
    /// Gateway to the generative model.
    pub gateway: ContentGateway,
    /// The study session controller.
    pub sessions: StudySessions,
}

impl AppState {
    /// Creates state over a fresh curriculum.
    #[must_use]
    pub fn new(config: Config, model: Arc<dyn GenerativeModel>) -> Self {
        Self::with_store(config, model, TaskStore::new())
    }

    /// Creates state over an existing store.
    #[must_use]
    pub fn with_store(config: Config, model: Arc<dyn GenerativeModel>, store: TaskStore) -> Self {
        let gateway = ContentGateway::new(model, &config);
        Self {
            sessions: StudySessions::new(gateway.clone()),
            gateway,
            store: Arc::new(Mutex::new(store)),
            config,
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// Malformed or blank input.
    BadRequest(String),
    /// The addressed resource does not exist.
    NotFound(String),
    /// The session is not in a state that allows the request.
    Conflict(String),
    /// Anything else.
    Internal(String),
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::NoActiveSession => Self::NotFound(err.to_string()),
            PlannerError::SessionConflict { .. } => Self::Conflict(err.to_string()),
            PlannerError::InvalidAnswer { .. } => Self::BadRequest(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries permissive CORS for a browser front end and request
/// tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/curriculum", get(handle_curriculum))
        .route("/curriculum/:day", get(handle_day))
        .route("/weeks", get(handle_weeks))
        .route("/tasks/:id/toggle", post(handle_toggle))
        .route("/stats", get(handle_stats))
        .route("/days/:day/select", post(handle_select_day))
        .route("/tutor", post(handle_tutor))
        .route(
            "/session",
            post(handle_open_session)
                .get(handle_get_session)
                .delete(handle_close_session),
        )
        .route("/session/answer", post(handle_answer))
        .route("/session/next", post(handle_next))
        .route("/session/complete", post(handle_complete));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

async fn handle_curriculum(State(state): State<Arc<AppState>>) -> Json<Vec<DailyPlan>> {
    Json(state.store.lock().await.plans().to_vec())
}

async fn handle_day(
    State(state): State<Arc<AppState>>,
    Path(day): Path<u32>,
) -> Result<Json<DailyPlan>, ApiError> {
    state
        .store
        .lock()
        .await
        .day(day)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Day {day} is not part of the roadmap")))
}

async fn handle_weeks(State(state): State<Arc<AppState>>) -> Json<Vec<WeekSummary>> {
    Json(state.store.lock().await.week_summaries())
}

/// Handler for `POST /api/tasks/:id/toggle`.
///
/// Unknown ids are not an error; the response reports `found: false`.
async fn handle_toggle(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Json<ToggleResponse> {
    let outcome = state.store.lock().await.toggle(&task_id);
    if !outcome.found() {
        warn!(task_id = %task_id, "Toggle requested for unknown task");
    }
    Json(ToggleResponse {
        found: outcome.found(),
        completed: outcome.completed,
        total_completed: outcome.total_completed,
    })
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse::from_store(&*state.store.lock().await))
}

/// Handler for `POST /api/days/:day/select`.
///
/// Days outside the roadmap select day 1.
async fn handle_select_day(
    State(state): State<Arc<AppState>>,
    Path(day): Path<u32>,
) -> Result<Json<DailyPlan>, ApiError> {
    let mut store = state.store.lock().await;
    let plan = store
        .select_day(day)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("The roadmap has no days".to_string()))?;
    info!(requested = day, selected = plan.day, "Day selected");
    Ok(Json(plan))
}

/// Handler for `POST /api/tutor`.
///
/// Service failures are answered with the fallback reply, never an error status.
async fn handle_tutor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TutorRequest>,
) -> Result<Json<TutorResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be blank".to_string()));
    }

    let context = request
        .context
        .as_deref()
        .map(str::trim)
        .filter(|context| !context.is_empty())
        .unwrap_or(state.config.tutor_context.as_str());

    let reply = state.gateway.tutor_reply(question, context).await;
    Ok(Json(TutorResponse { reply }))
}

/// Handler for `POST /api/session`.
///
/// Answers `202 Accepted` immediately; content is generated in the background.
async fn handle_open_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<OpenSessionResponse>), ApiError> {
    let task = state
        .store
        .lock()
        .await
        .find_task(&request.task_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Unknown task '{}'", request.task_id)))?;

    let outcome = state.sessions.open(task).await;
    let session = state.sessions.current().await;

    Ok((
        StatusCode::ACCEPTED,
        Json(OpenSessionResponse {
            accepted: outcome.is_started(),
            session,
        }),
    ))
}

async fn handle_get_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionView>, ApiError> {
    state
        .sessions
        .current()
        .await
        .map(Json)
        .ok_or_else(|| PlannerError::NoActiveSession.into())
}

async fn handle_close_session(State(state): State<Arc<AppState>>) -> Json<CloseSessionResponse> {
    let closed = state.sessions.close().await;
    Json(CloseSessionResponse { closed })
}

async fn handle_answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerFeedback>, ApiError> {
    Ok(Json(state.sessions.answer(request.option).await?))
}

async fn handle_next(State(state): State<Arc<AppState>>) -> Result<Json<AdvanceOutcome>, ApiError> {
    Ok(Json(state.sessions.advance().await?))
}

/// Handler for `POST /api/session/complete`.
///
/// Requires a finished quiz; marks the task complete and closes the session.
async fn handle_complete(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CompleteSessionResponse>, ApiError> {
    let mut store = state.store.lock().await;
    let outcome = state.sessions.complete(&mut store).await?;
    Ok(Json(CompleteSessionResponse {
        task_id: outcome.task_id,
        toggled: outcome.toggled,
        stats: StatsResponse::from_store(&store),
    }))
}
