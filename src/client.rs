//! Transport between the client session and a `chatcsvd` server.
//!
//! [`ChatTransport`] is the seam the session talks through; [`HttpTransport`]
//! is the real implementation over a blocking `ureq` agent, and
//! [`LocalTransport`] answers from an in-process rule table (used by
//! `chatcsv match` and in tests).

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::matcher::{self, Reply};
use crate::rules::RuleTable;

// ---------------------------------------------------------------------------
// Client error
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error("remote request failed: {message}")]
    #[diagnostic(code(chatcsv::client::request), help("Is chatcsvd running at the configured URL?"))]
    Request { message: String },

    #[error("server answered with HTTP {status}")]
    #[diagnostic(code(chatcsv::client::status))]
    Status { status: u16 },

    #[error("unexpected response from server: {message}")]
    #[diagnostic(code(chatcsv::client::response), help("Server version mismatch?"))]
    Response { message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Sends one chat message and returns the server's reply.
pub trait ChatTransport {
    fn chat(&self, message: &str) -> ClientResult<Reply>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// `POST {base_url}/chat` over HTTP.
pub struct HttpTransport {
    base_url: String,
    http: ureq::Agent,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

impl ChatTransport for HttpTransport {
    fn chat(&self, message: &str) -> ClientResult<Reply> {
        let url = format!("{}/chat", self.base_url);
        let resp = match self
            .http
            .post(&url)
            .send_json(serde_json::json!({ "message": message }))
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, _)) => return Err(ClientError::Status { status }),
            Err(ureq::Error::Transport(t)) => {
                return Err(ClientError::Request {
                    message: t.to_string(),
                });
            }
        };
        resp.into_json().map_err(|e| ClientError::Response {
            message: format!("failed to parse JSON: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// Answers from a local rule table without a server.
pub struct LocalTransport {
    rules: RuleTable,
}

impl LocalTransport {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }
}

impl ChatTransport for LocalTransport {
    fn chat(&self, message: &str) -> ClientResult<Reply> {
        Ok(matcher::find(message, &self.rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    #[test]
    fn unreachable_server_is_a_request_error() {
        // Port 9 (discard) on localhost is essentially never listening.
        let t = HttpTransport::new("http://127.0.0.1:9");
        assert!(matches!(t.chat("hi"), Err(ClientError::Request { .. })));
    }

    #[test]
    fn local_transport_uses_matcher() {
        let t = LocalTransport::new(RuleTable::from_rules(vec![Rule::new("hi", "Hello!", "")]));
        assert_eq!(t.chat("oh hi").unwrap().message, "Hello!");
        assert_eq!(t.chat("nope").unwrap(), Reply::fallback());
    }
}
