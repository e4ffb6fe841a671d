//! Mock Perplexity API server for integration tests
//!
//! Serves `/chat/completions` with canned JSON or SSE bodies and counts
//! received requests, so tests can assert that invalid requests never reach
//! the transport.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Mock Perplexity backend returning predictable responses
pub struct MockApi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockApiState>,
}

struct MockApiState {
    completion_count: AtomicU32,
    /// Respond to every request with this status (None = 200)
    fail_status: Option<u16>,
    /// Raw SSE body for streaming requests (None = default two-chunk body)
    stream_body: Option<String>,
    /// Sleep this long before sending response headers
    header_delay: Option<std::time::Duration>,
    /// Last Authorization header received
    last_authorization: Mutex<Option<String>>,
}

impl MockApi {
    /// Start the mock server with default canned responses
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(None, None, None).await
    }

    /// Start a mock server that answers every request with `status`
    pub async fn start_failing(status: u16) -> anyhow::Result<Self> {
        Self::start_inner(Some(status), None, None).await
    }

    /// Start a mock server with a custom raw SSE body
    pub async fn start_with_stream_body(body: &str) -> anyhow::Result<Self> {
        Self::start_inner(None, Some(body.to_owned()), None).await
    }

    /// Start a mock server that stalls before sending response headers
    pub async fn start_with_header_delay(delay: std::time::Duration) -> anyhow::Result<Self> {
        Self::start_inner(None, None, Some(delay)).await
    }

    async fn start_inner(
        fail_status: Option<u16>,
        stream_body: Option<String>,
        header_delay: Option<std::time::Duration>,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(MockApiState {
            completion_count: AtomicU32::new(0),
            fail_status,
            stream_body,
            header_delay,
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route("/chat/completions", routing::post(handle_chat_completions))
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

    /// Endpoint URL to hand the client as its base URL
    pub fn endpoint(&self) -> url::Url {
        url::Url::parse(&format!("http://{}/chat/completions", self.addr)).unwrap()
    }

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// Authorization header of the last request, if any
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    model: String,
    #[allow(dead_code)]
    messages: Vec<serde_json::Value>,
    #[serde(default)]
    stream: bool,
}

/// Default SSE body: two content chunks, a terminal chunk with
/// `finish_reason` and usage, then the sentinel
fn default_stream_body(model: &str) -> String {
    let chunks = [
        serde_json::json!({
            "id": "cmpl-mock-stream",
            "model": model,
            "created": 1_700_000_000u64,
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hello"}}]
        }),
        serde_json::json!({
            "id": "cmpl-mock-stream",
            "model": model,
            "created": 1_700_000_000u64,
            "choices": [{"index": 0, "delta": {"content": " from mock"}}]
        }),
        serde_json::json!({
            "id": "cmpl-mock-stream",
            "model": model,
            "created": 1_700_000_000u64,
            "choices": [{"index": 0, "delta": {"content": ""}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }),
    ];

    let mut body = String::new();
    for chunk in &chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn handle_chat_completions(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
    Json(req): Json<ChatCompletionRequest>,
) -> impl IntoResponse {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    if let Some(delay) = state.header_delay {
        tokio::time::sleep(delay).await;
    }
    *state.last_authorization.lock().unwrap() = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    if let Some(status) = state.fail_status {
        return (
            StatusCode::from_u16(status).unwrap(),
            Json(serde_json::json!({
                "error": {
                    "message": "mock server intentional failure",
                    "type": "server_error"
                }
            })),
        )
            .into_response();
    }

    if req.stream {
        let body = state
            .stream_body
            .clone()
            .unwrap_or_else(|| default_stream_body(&req.model));
        return ([(CONTENT_TYPE, "text/event-stream")], body).into_response();
    }

    Json(serde_json::json!({
        "id": "cmpl-mock-123",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": req.model,
        "citations": ["https://example.com/source"],
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": {"role": "assistant", "content": "Hello from mock"}
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
    }))
    .into_response()
}
