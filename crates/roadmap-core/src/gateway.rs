//! Content Request Gateway: the only path to the generative-language service.
//!
//! Two operations are exposed:
//!
//! - [`ContentGateway::tutor_reply`] always returns a string; failures become a
//!   fixed fallback message.
//! - [`ContentGateway::study_content`] returns `None` when content is
//!   unavailable. [`ContentGateway::try_study_content`] is the same request with
//!   the failure reason kept.
//!
//! Every call is a fresh request: no retries, no caching, no timeout override.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::content::{ContentPlan, ContentRequest, GeneratedContent};
use crate::error::{PlannerError, Result};

/// Reply returned when the tutor cannot reach the service.
pub const TUTOR_FALLBACK: &str = "AI 튜터와 연결할 수 없습니다. 잠시 후 다시 시도해주세요.";

/// Reply returned when the service answers with no text.
pub const EMPTY_REPLY_FALLBACK: &str = "응답을 가져오지 못했습니다.";

// ============================================================================
// Model seam
// ============================================================================

/// One request to a generative model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    /// Model identifier.
    pub model: String,
    /// Natural-language prompt.
    pub prompt: String,
    /// Sampling temperature, if overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// JSON response schema; `Some` makes this a structured request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl ModelRequest {
    /// Creates a free-text request.
    #[must_use]
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            response_schema: None,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Constrains the reply to JSON matching `schema`.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Returns `true` for schema-constrained requests.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        self.response_schema.is_some()
    }
}

/// A hosted generative-language model.
///
/// Implementations return the raw reply text. They must not retry.
pub trait GenerativeModel: Send + Sync {
    /// Sends one request and resolves to the reply text.
    fn generate<'a>(&'a self, request: &'a ModelRequest) -> BoxFuture<'a, Result<String>>;
}

// ============================================================================
// ContentGateway
// ============================================================================

/// Gateway translating tasks and questions into model requests.
#[derive(Clone)]
pub struct ContentGateway {
    model: Arc<dyn GenerativeModel>,
    model_name: String,
    tutor_temperature: f32,
}

impl std::fmt::Debug for ContentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGateway")
            .field("model_name", &self.model_name)
            .field("tutor_temperature", &self.tutor_temperature)
            .finish_non_exhaustive()
    }
}

impl ContentGateway {
    /// Creates a gateway over `model` using the model name and temperature from `config`.
    #[must_use]
    pub fn new(model: Arc<dyn GenerativeModel>, config: &Config) -> Self {
        Self {
            model,
            model_name: config.model.clone(),
            tutor_temperature: config.tutor_temperature,
        }
    }

    /// Builds the free-form tutor request.
    #[must_use]
    pub fn tutor_request(&self, question: &str, context: &str) -> ModelRequest {
        ModelRequest::text(&self.model_name, tutor_prompt(question, context))
            .with_temperature(self.tutor_temperature)
    }

    /// Builds the structured study-content request.
    #[must_use]
    pub fn study_request(&self, request: &ContentRequest) -> ModelRequest {
        let plan = request.plan();
        ModelRequest::text(&self.model_name, study_prompt(request, &plan))
            .with_schema(plan.response_schema())
    }

    /// Asks the tutor a question.
    ///
    /// Never fails: a transport or service failure yields [`TUTOR_FALLBACK`],
    /// an empty reply yields [`EMPTY_REPLY_FALLBACK`].
    pub async fn tutor_reply(&self, question: &str, context: &str) -> String {
        let request = self.tutor_request(question, context);
        debug!(question_len = question.len(), context, "Requesting tutor reply");

        match self.model.generate(&request).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Tutor reply was empty");
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Ok(text) => {
                info!(reply_len = text.len(), "Tutor reply received");
                text
            }
            Err(PlannerError::EmptyResponse { reason }) => {
                warn!(reason = %reason, "Tutor reply was empty");
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Tutor request failed");
                TUTOR_FALLBACK.to_string()
            }
        }
    }

    /// Generates study content, keeping the failure reason.
    pub async fn try_study_content(&self, request: &ContentRequest) -> Result<GeneratedContent> {
        let model_request = self.study_request(request);
        let plan = request.plan();
        debug!(
            title = %request.title,
            quiz_count = plan.quiz_count,
            example_count = plan.example_count,
            scaled = plan.scaled,
            "Requesting study content"
        );

        let text = self.model.generate(&model_request).await?;
        let content = GeneratedContent::parse(&text)?;

        info!(
            title = %request.title,
            quizzes = content.quizzes.len(),
            examples = content.examples.len(),
            "Study content generated"
        );
        Ok(content)
    }

    /// Generates study content, or `None` when it is unavailable.
    pub async fn study_content(&self, request: &ContentRequest) -> Option<GeneratedContent> {
        match self.try_study_content(request).await {
            Ok(content) => Some(content),
            Err(e) => {
                log_content_failure(&request.title, &e);
                None
            }
        }
    }
}

fn log_content_failure(title: &str, error: &PlannerError) {
    if error.is_content_error() {
        warn!(title, error = %error, "Model reply rejected");
    } else {
        warn!(
            title,
            error = %error,
            transient = error.is_transient(),
            "Study content request failed"
        );
    }
}

fn tutor_prompt(question: &str, context: &str) -> String {
    format!(
        "Context: You are a professional TOEIC tutor for a Korean student (CSAT English Grade 2).\n\
         Session context: {context}.\n\
         User Question: {question}\n\
         Provide a concise, practical explanation in Korean. Focus on 800+ score strategies."
    )
}

fn study_prompt(request: &ContentRequest, plan: &ContentPlan) -> String {
    let session = match request.duration {
        Some(minutes) if plan.scaled => format!("학습 시간: {minutes}분 분량\n"),
        _ => String::new(),
    };
    format!(
        "토익 800점을 목표로 하는 학생을 위해 다음 주제에 대한 학습 내용을 생성해주세요:\n\
         주제: {title} ({description})\n\
         {session}\n\
         형식: JSON으로 다음 정보를 포함하세요.\n\
         1. lesson: 핵심 이론 설명 (Markdown 형식, 한국어)\n\
         2. examples: 실전 예문 {examples}개와 해석 (sentence, translation)\n\
         3. quizzes: 관련 퀴즈 {quizzes}문제 배열 (question, 보기 4개 options, 정답 인덱스 answer, 해설 explanation)",
        title = request.title,
        description = request.description,
        examples = plan.example_count,
        quizzes = plan.quiz_count,
    )
}

// ============================================================================
// Test support
// ============================================================================
