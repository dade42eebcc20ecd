//! HTTP surface of `chatcsvd`.
//!
//! - `POST /chat`: match a message against the rule table
//! - `OPTIONS *`: `204` with permissive CORS headers
//! - anything else: static files from the public and pages roots
//!
//! Every response carries the same three CORS headers.

pub mod assets;

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::chatlog::InteractionLogger;
use crate::config::ServerConfig;
use crate::matcher::{self, Reply};
use crate::rules::RuleTable;

/// Message returned with a `400` for unparseable bodies.
pub const INVALID_REQUEST: &str = "invalid request";

// ── Server state ──────────────────────────────────────────────────────────

/// Everything a request handler needs. Read-only once serving starts.
#[derive(Debug)]
pub struct AppState {
    pub rules: RuleTable,
    pub logger: InteractionLogger,
    pub public_dir: PathBuf,
    pub pages_dir: PathBuf,
}

impl AppState {
    pub fn new(
        rules: RuleTable,
        logger: InteractionLogger,
        public_dir: impl Into<PathBuf>,
        pages_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rules,
            logger,
            public_dir: public_dir.into(),
            pages_dir: pages_dir.into(),
        }
    }

    /// Load the rule table and open the interaction log named by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            RuleTable::from_file(&config.responses),
            InteractionLogger::to_file(&config.chatlog),
            absolute(&config.public_dir),
            absolute(&config.pages_dir),
        )
    }
}

fn absolute(path: &std::path::Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ── Router ────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/chat",
            post(chat)
                .layer(DefaultBodyLimit::disable())
                .fallback(assets::serve),
        )
        .fallback(assets::serve)
        .layer(middleware::from_fn(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(req).await
}

async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(message) = message_from_body(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(Reply {
                message: INVALID_REQUEST.to_string(),
                redirect: None,
            }),
        )
            .into_response();
    };

    let reply = matcher::find(&message, &state.rules);

    // Detached: the response never waits on, or learns about, the append.
    let logger = state.logger.clone();
    let bot = reply.message.clone();
    tokio::task::spawn_blocking(move || logger.record(&message, &bot));

    Json(reply).into_response()
}

/// Pull the `message` field out of a request body.
///
/// An empty body counts as `{}`. A missing message, or one that is `null`,
/// `false`, or zero, is the empty string; other numbers and `true` are
/// stringified. `None` means the body is not usable JSON.
pub fn message_from_body(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = if text.is_empty() { "{}" } else { &*text };

    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Object(map) => Some(match map.get("message") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => number_text(n),
            Some(serde_json::Value::Bool(true)) => "true".to_string(),
            _ => String::new(),
        }),
        _ => Some(String::new()),
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return if i == 0 { String::new() } else { i.to_string() };
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f != 0.0 => f.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_extraction() {
        assert_eq!(message_from_body(br#"{"message":"hi"}"#).as_deref(), Some("hi"));
        assert_eq!(message_from_body(b"").as_deref(), Some(""));
        assert_eq!(message_from_body(b"{}").as_deref(), Some(""));
        assert_eq!(message_from_body(br#"{"message":42}"#).as_deref(), Some("42"));
        assert_eq!(message_from_body(br#"{"message":2.5}"#).as_deref(), Some("2.5"));
        assert_eq!(message_from_body(br#"{"message":1.0}"#).as_deref(), Some("1"));
        assert_eq!(message_from_body(br#"{"message":true}"#).as_deref(), Some("true"));
        assert_eq!(message_from_body(br#"{"message":null}"#).as_deref(), Some(""));
        assert_eq!(message_from_body(b"[1,2]").as_deref(), Some(""));
    }

    #[test]
    fn falsy_messages_are_empty() {
        for body in [
            br#"{"message":0}"#.as_slice(),
            br#"{"message":0.0}"#,
            br#"{"message":-0.0}"#,
            br#"{"message":false}"#,
            br#"{"message":""}"#,
        ] {
            assert_eq!(message_from_body(body).as_deref(), Some(""), "{body:?}");
        }
    }

    #[test]
    fn unusable_bodies_are_rejected() {
        assert_eq!(message_from_body(b"{not json"), None);
        assert_eq!(message_from_body(b"null"), None);
        assert_eq!(message_from_body(b"   "), None);
    }
}
