//! End-to-end tests for the planner HTTP API.
//!
//! Each test starts a mock `generateContent` server and the planner API on
//! ephemeral ports, then drives the API over HTTP with `reqwest`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use roadmap_core::{
    create_router, AppState, Config, ContentGateway, ContentRequest, GeminiClient,
    EMPTY_REPLY_FALLBACK, TUTOR_FALLBACK,
};
use serde_json::{json, Value};

const API_KEY: &str = "test-key";
const TUTOR_TEXT: &str = "because는 접속사라서 뒤에 절이 옵니다.";

// ============================================================================
// Mock generative service
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Answers every request.
    Healthy,
    /// Answers 429 with a JSON error body.
    RateLimited,
    /// Reports a blocked prompt.
    Blocked,
}

#[derive(Debug, Clone)]
struct Captured {
    call: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockGemini {
    mode: Mode,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockGemini {
    fn captured(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

fn study_text(quizzes: usize) -> String {
    let quizzes: Vec<Value> = (0..quizzes)
        .map(|i| {
            json!({
                "question": format!("The package arrived ------- schedule. ({i})"),
                "options": ["(A) ahead of", "(B) because", "(C) although", "(D) whereas"],
                "answer": 0,
                "explanation": "명사구 앞에는 전치사가 옵니다."
            })
        })
        .collect();
    json!({
        "lesson": "## 전치사 vs 접속사\n전치사 뒤에는 명사, 접속사 뒤에는 절.",
        "examples": [
            { "sentence": "The flight was delayed because of the storm.", "translation": "폭풍 때문에 항공편이 지연되었습니다." }
        ],
        "quizzes": quizzes
    })
    .to_string()
}

async fn generate(
    State(mock): State<MockGemini>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.captured.lock().unwrap().push(Captured {
        call,
        api_key: api_key.clone(),
        body: body.clone(),
    });

    if api_key.as_deref() != Some(API_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" } })),
        )
            .into_response();
    }

    match mock.mode {
        Mode::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" } })),
        )
            .into_response(),
        Mode::Blocked => {
            Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).into_response()
        }
        Mode::Healthy => {
            let structured = body["generationConfig"]["responseSchema"].is_object();
            let text = if structured { study_text(3) } else { TUTOR_TEXT.to_string() };
            Json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": text }] },
                    "finishReason": "STOP"
                }]
            }))
            .into_response()
        }
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

async fn start_mock(mode: Mode) -> (MockGemini, String) {
    let mock = MockGemini {
        mode,
        captured: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new()
        .route("/v1beta/models/:call", post(generate))
        .with_state(mock.clone());
    let addr = serve(router).await;
    (mock, format!("http://{addr}"))
}

fn config_for(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        ..Config::default()
    }
}

/// Starts the mock service and the planner API; returns the mock and the API base URL.
async fn start_planner(mode: Mode, api_key: &str) -> (MockGemini, String) {
    let (mock, mock_url) = start_mock(mode).await;
    let config = config_for(&mock_url);
    let model = Arc::new(GeminiClient::new(&config, api_key));
    let addr = serve(create_router(AppState::new(config, model))).await;
    (mock, format!("http://{addr}"))
}

async fn wait_settled(client: &reqwest::Client, api: &str) -> Value {
    for _ in 0..100 {
        let session: Value = client
            .get(format!("{api}/api/session"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if session["phase"] != "loading" {
            return session;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Value::Null
}

// ============================================================================
// Tutor
// ============================================================================

#[tokio::test]
async fn test_tutor_round_trip_through_gemini_client() {
    let (mock, api) = start_planner(Mode::Healthy, API_KEY).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{api}/api/tutor"))
        .json(&json!({ "question": "because vs because of 차이?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reply"], TUTOR_TEXT);

    let captured = mock.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].call, "gemini-3-flash-preview:generateContent");
    assert_eq!(captured[0].api_key.as_deref(), Some(API_KEY));

    let sent = &captured[0].body;
    assert_eq!(sent["contents"][0]["role"], "user");
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("User Question: because vs because of 차이?"));
    assert!(prompt.contains("TOEIC Study Session - General Help"));
    assert!(sent["generationConfig"]["responseSchema"].is_null());
}

#[tokio::test]
async fn test_tutor_rate_limited_returns_fallback() {
    let (mock, api) = start_planner(Mode::RateLimited, API_KEY).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{api}/api/tutor"))
        .json(&json!({ "question": "Part 2 전략?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["reply"], TUTOR_FALLBACK);
    // no retry
    assert_eq!(mock.captured().len(), 1);
}

#[tokio::test]
async fn test_tutor_blocked_prompt_returns_no_reply_message() {
    let (_mock, api) = start_planner(Mode::Blocked, API_KEY).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{api}/api/tutor"))
        .json(&json!({ "question": "q" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["reply"], EMPTY_REPLY_FALLBACK);
}

// ============================================================================
// Study session
// ============================================================================

#[tokio::test]
async fn test_study_session_end_to_end() {
    let (mock, api) = start_planner(Mode::Healthy, API_KEY).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{api}/api/session"))
        .json(&json!({ "taskId": "d1-2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    let session = wait_settled(&client, &api).await;
    assert_eq!(session["phase"], "ready");
    assert_eq!(session["quizCount"], 3);

    // the structured request carries the schema and the sized prompt
    let captured = mock.captured();
    let sent = &captured[0].body;
    assert_eq!(sent["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(sent["generationConfig"]["responseSchema"]["type"], "OBJECT");
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("관련 퀴즈 8문제"));
    assert!(prompt.contains("실전 예문 12개"));

    for index in 0..3 {
        let feedback: Value = client
            .post(format!("{api}/api/session/answer"))
            .json(&json!({ "option": 0 }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(feedback["correct"], true);
        assert_eq!(feedback["isLast"], index == 2);

        let next: Value = client
            .post(format!("{api}/api/session/next"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(next["finished"], index == 2);
    }

    let done: Value = client
        .post(format!("{api}/api/session/complete"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done["taskId"], "d1-2");
    assert_eq!(done["stats"]["totalCompletedTasks"], 1);
    assert_eq!(done["stats"]["remaining"], 62);

    let day: Value = client
        .get(format!("{api}/api/curriculum/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day["tasks"][1]["isCompleted"], true);
}

#[tokio::test]
async fn test_study_session_with_bad_credential_is_unavailable() {
    let (_mock, api) = start_planner(Mode::Healthy, "wrong-key").await;
    let client = reqwest::Client::new();

    client
        .post(format!("{api}/api/session"))
        .json(&json!({ "taskId": "d15-1" }))
        .send()
        .await
        .unwrap();

    let session = wait_settled(&client, &api).await;
    assert_eq!(session["phase"], "unavailable");
    assert!(session["content"].is_null());

    let response = client
        .post(format!("{api}/api/session/complete"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

// ============================================================================
// Gateway against the REST client
// ============================================================================

#[tokio::test]
async fn test_gateway_study_content_over_http() {
    let (_mock, mock_url) = start_mock(Mode::Healthy).await;
    let config = config_for(&mock_url);
    let gateway = ContentGateway::new(Arc::new(GeminiClient::new(&config, API_KEY)), &config);

    let content = gateway
        .study_content(&ContentRequest::new("Part 5 전치사", "전치사와 접속사 구분"))
        .await
        .expect("content should be available");
    assert_eq!(content.quizzes.len(), 3);
    assert_eq!(content.examples.len(), 1);
    assert!(content.lesson.starts_with("## 전치사 vs 접속사"));
}

#[tokio::test]
async fn test_gateway_rate_limited_keeps_reason() {
    let (_mock, mock_url) = start_mock(Mode::RateLimited).await;
    let config = config_for(&mock_url);
    let gateway = ContentGateway::new(Arc::new(GeminiClient::new(&config, API_KEY)), &config);

    let err = gateway
        .try_study_content(&ContentRequest::new("t", "d"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    // nothing listens on this port once the listener is dropped
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = config_for(&format!("http://{addr}"));
    let gateway = ContentGateway::new(Arc::new(GeminiClient::new(&config, API_KEY)), &config);

    assert!(gateway.study_content(&ContentRequest::new("t", "d")).await.is_none());
    assert_eq!(gateway.tutor_reply("q", "ctx").await, TUTOR_FALLBACK);
}
