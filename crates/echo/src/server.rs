//! Router and handlers for the fake chat-completions endpoint.
//!
//! Every accepted request is dumped to disk and summarized in the log, so
//! the structured turns a guard produced can be inspected exactly as they
//! would reach a real provider. Responses are canned; nothing is generated.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
pub struct EchoState {
    /// Directory receiving one JSON file per request
    pub dump_dir: PathBuf,
}

/// Build the echo router.
pub fn build_router(state: Arc<EchoState>) -> Router {
    Router::new()
        .route("/chat/completions", post(chat_completions))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start serving on `addr` until the process is stopped.
pub async fn serve(addr: &str, state: Arc<EchoState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    info!(addr = %addr, "Echo server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

async fn chat_completions(
    State(state): State<Arc<EchoState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let payload = parse_payload(&body);
    dump_request(&state.dump_dir, &method, &uri, &payload).await;
    log_summary(&payload);

    if payload.get("stream").and_then(Value::as_bool).unwrap_or(false) {
        let events = stream_events(&payload);
        let stream = futures::stream::iter(events.into_iter().map(Ok::<_, Infallible>));
        return Sse::new(stream).into_response();
    }

    Json(completion_response(&payload)).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "message": format!(
                    "Unsupported path {}; use /chat/completions or /v1/chat/completions",
                    uri.path()
                ),
                "type": "invalid_request_error",
            }
        })),
    )
}

// --- Request inspection ---

/// Tolerant body parsing: non-object and non-JSON bodies are wrapped
/// instead of rejected, so every request still gets dumped.
fn parse_payload(body: &Bytes) -> Value {
    if body.is_empty() {
        return json!({});
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => json!({"_raw": other}),
        Err(_) => json!({"_raw_text": String::from_utf8_lossy(body)}),
    }
}

/// Write the wrapped request to `<dump_dir>/request_<utc micros>.json`.
/// Dump failures are logged and the request is still answered.
async fn dump_request(dump_dir: &Path, method: &Method, uri: &Uri, payload: &Value) {
    let wrapped = json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "method": method.as_str(),
        "path": uri.path(),
        "payload": payload,
    });
    let file = dump_dir.join(format!(
        "request_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S_%6f")
    ));

    if let Err(e) = tokio::fs::create_dir_all(dump_dir).await {
        warn!(dir = %dump_dir.display(), error = %e, "Failed to create dump directory");
        return;
    }
    let body = serde_json::to_string_pretty(&wrapped).unwrap_or_default();
    match tokio::fs::write(&file, body).await {
        Ok(()) => info!(file = %file.display(), "Request dumped"),
        Err(e) => warn!(file = %file.display(), error = %e, "Failed to dump request"),
    }
}

/// Log one line per message plus a role distribution summary.
fn log_summary(payload: &Value) {
    let model = payload.get("model").and_then(Value::as_str).unwrap_or("");
    let stream = payload.get("stream").and_then(Value::as_bool).unwrap_or(false);
    info!(model, stream, "Received completion request");

    let Some(messages) = payload.get("messages").and_then(Value::as_array) else {
        warn!("Request carries no messages array");
        return;
    };

    let mut role_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, message) in messages.iter().enumerate() {
        let role = message
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        *role_counts.entry(role).or_default() += 1;

        let content = match message.get("content") {
            Some(Value::String(text)) => preview(text),
            Some(other) => preview(&other.to_string()),
            None => String::new(),
        };
        info!("  {:02}. role={:<9} content={}", idx + 1, role, content);
    }

    let roles = role_counts
        .iter()
        .map(|(role, count)| format!("{role}:{count}"))
        .collect::<Vec<_>>()
        .join(", ");
    info!(total = messages.len(), roles = %roles, "Message summary");
}

/// Single-line preview capped at 100 characters.
fn preview(text: &str) -> String {
    let flat = text.replace('\n', "\\n");
    if flat.chars().count() > 100 {
        let head: String = flat.chars().take(100).collect();
        format!("{head}...")
    } else {
        flat
    }
}

// --- Canned responses ---

fn completion_response(payload: &Value) -> Value {
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("mock-model");
    let created = Utc::now().timestamp();

    json!({
        "id": format!("chatcmpl-mock-{created}"),
        "object": "chat.completion",
        "created": created,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "mock response"},
            "finish_reason": "stop",
        }],
        "usage": {
            "prompt_tokens": 100,
            "completion_tokens": 2,
            "total_tokens": 102,
        },
    })
}

/// Two content chunks, a stop chunk, then the `[DONE]` sentinel.
fn stream_events(payload: &Value) -> Vec<Event> {
    let model = payload
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("mock-model");
    let created = Utc::now().timestamp();
    let id = format!("chatcmpl-mock-{created}");

    let chunk = |delta: Value, finish_reason: Value| {
        json!({
            "id": id,
            "object": "chat.completion.chunk",
            "created": created,
            "model": model,
            "choices": [{
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason,
            }],
        })
    };

    [
        chunk(json!({"role": "assistant", "content": "mock"}), Value::Null),
        chunk(json!({"content": " response"}), Value::Null),
        chunk(json!({}), json!("stop")),
    ]
    .iter()
    .map(|c| Event::default().data(serde_json::to_string(c).unwrap_or_default()))
    .chain(std::iter::once(Event::default().data("[DONE]")))
    .collect()
}
