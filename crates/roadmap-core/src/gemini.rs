//! REST client for the Gemini `generateContent` endpoint.
//!
//! Only the subset of the wire format the planner needs is modelled: one user
//! turn of text, an optional temperature, and an optional JSON response schema.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{LlmErrorKind, PlannerError, Result};
use crate::gateway::{GenerativeModel, ModelRequest};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// MIME type requested for schema-constrained replies.
const JSON_MIME_TYPE: &str = "application/json";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

impl GenerationConfig<'_> {
    const fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.response_mime_type.is_none()
            && self.response_schema.is_none()
    }
}

impl<'a> From<&'a ModelRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a ModelRequest) -> Self {
        let schema = request.response_schema.as_ref();
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: schema.map(|_| JSON_MIME_TYPE),
                response_schema: schema,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Extracts the reply text from a successful response body.
///
/// The text is the concatenation of the first candidate's text parts.
fn extract_text(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        PlannerError::llm_api_error(LlmErrorKind::Other, format!("unreadable response body: {e}"))
    })?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(PlannerError::empty_response(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(PlannerError::empty_response("no candidates"));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .map_or_else(|| "no text".to_string(), |r| format!("no text (finish reason {r})"));
        return Err(PlannerError::empty_response(reason));
    }
    Ok(text)
}

/// Builds a readable message from an error response body.
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message: Some(message),
                status: Some(code),
            },
        }) => format!("HTTP {status} {code}: {message}"),
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message: Some(message),
                ..
            },
        }) => format!("HTTP {status}: {message}"),
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => format!("HTTP {status}: {}", body.trim()),
    }
}

// ============================================================================
// GeminiClient
// ============================================================================

/// [`GenerativeModel`] backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client for `config.api_base_url` authenticating with `api_key`.
    #[must_use]
    pub fn new(config: &Config, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Resolves the API key from the environment and creates a client.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::MissingCredential` if no key is set.
    pub fn from_env(config: &Config) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(config, api_key))
    }

    /// URL of the `generateContent` method for `model`.
    #[must_use]
    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    async fn send(&self, request: &ModelRequest) -> Result<String> {
        let url = self.endpoint(&request.model);
        debug!(
            model = %request.model,
            structured = request.is_structured(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&GenerateContentRequest::from(request))
            .send()
            .await
            .map_err(|e| PlannerError::llm_api_error(LlmErrorKind::Network, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlannerError::llm_api_error(LlmErrorKind::Network, e.to_string()))?;

        if !status.is_success() {
            let code = status.as_u16();
            return Err(PlannerError::llm_api_error(
                LlmErrorKind::from_status(code),
                error_message(code, &body),
            ));
        }

        extract_text(&body)
    }
}

impl GenerativeModel for GeminiClient {
    fn generate<'a>(&'a self, request: &'a ModelRequest) -> BoxFuture<'a, Result<String>> {
        self.send(request).boxed()
    }
}
