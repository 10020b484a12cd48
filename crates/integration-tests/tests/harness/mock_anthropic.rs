//! Mock Anthropic Messages API for integration tests
//!
//! Answers `POST /v1/messages` with a tool call for whichever tool the
//! request forces, and records what it received.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// How the mock replies
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Valid tool call for the forced tool
    ToolCall,
    /// 500 with an Anthropic error body
    Fail,
    /// Text-only reply without a tool call
    NoToolCall,
    /// Tool call whose input breaks the schema
    InvalidInput,
    /// Valid reply, sent after a delay
    Slow(Duration),
}

/// Mock upstream that returns predictable Messages API replies
pub struct MockAnthropic {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    behavior: Behavior,
    call_count: AtomicU32,
    requests: Mutex<Vec<Value>>,
    api_keys: Mutex<Vec<String>>,
    last_response: Mutex<Option<String>>,
}

impl MockAnthropic {
    /// Start a mock that replies with valid tool calls
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Behavior::ToolCall).await
    }

    pub async fn start_with(behavior: Behavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            behavior,
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            api_keys: Mutex::new(Vec::new()),
            last_response: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/messages", routing::post(handle_messages))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to configure as the upstream, including `/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of Messages API calls received
    pub fn call_count(&self) -> u32 {
        self.state.call_count.load(Ordering::Relaxed)
    }

    /// Request bodies received, in order
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// `x-api-key` header values received, in order
    pub fn api_keys(&self) -> Vec<String> {
        self.state.api_keys.lock().unwrap().clone()
    }

    /// Exact body of the most recent reply
    pub fn last_response(&self) -> Option<String> {
        self.state.last_response.lock().unwrap().clone()
    }
}

impl Drop for MockAnthropic {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_messages(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(req): Json<Value>) -> Response {
    state.call_count.fetch_add(1, Ordering::Relaxed);

    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    state.api_keys.lock().unwrap().push(api_key);

    let tool = req["tool_choice"]["name"].as_str().unwrap_or_default().to_owned();
    let model = req["model"].as_str().unwrap_or_default().to_owned();
    state.requests.lock().unwrap().push(req);

    let reply = match state.behavior {
        Behavior::Fail => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "type": "error",
                    "error": { "type": "api_error", "message": "mock server intentional failure" }
                })),
            )
                .into_response();
        }
        Behavior::NoToolCall => message(&model, json!([{ "type": "text", "text": "I would rather not." }])),
        Behavior::InvalidInput => message(
            &model,
            json!([{ "type": "tool_use", "id": "toolu_mock", "name": tool, "input": { "unexpected": true } }]),
        ),
        Behavior::ToolCall => message(&model, tool_call(&tool)),
        Behavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            message(&model, tool_call(&tool))
        }
    };

    // Pretty-printed so a relay that re-serializes would be noticed
    let body = serde_json::to_string_pretty(&reply).unwrap();
    *state.last_response.lock().unwrap() = Some(body.clone());

    ([(axum::http::header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn tool_call(tool: &str) -> Value {
    let input = match tool {
        "create_skill_questions" => json!({
            "question": "Which opening begins 1. e4 c5?",
            "skill_level_of_question": 240,
            "color": "#2E8B57"
        }),
        "evaluate_answer" => json!({
            "isCorrect": false,
            "correctAnswer": "4",
            "explanation": "Two plus two is four."
        }),
        _ => json!({}),
    };

    json!([{ "type": "tool_use", "id": "toolu_mock", "name": tool, "input": input }])
}

fn message(model: &str, content: Value) -> Value {
    json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": content,
        "stop_reason": "tool_use",
        "stop_sequence": null,
        "usage": { "input_tokens": 120, "output_tokens": 40 }
    })
}
