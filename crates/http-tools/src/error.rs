//! Tool-level error taxonomy.
//!
//! Every failure on the call path ends up as a `ToolError`, which is rendered back to the MCP
//! client as a `CallToolResult` with `is_error: true` (see [`ToolError::into_call_result`]).

use crate::config::NotFoundHint;
use rmcp::model::{CallToolResult, Content};
use sauce_mcp_env::EnvError;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    MissingCredentials(String),

    #[error("{0}")]
    InvalidRegion(String),

    #[error("authentication failed: upstream returned {status}")]
    AuthenticationFailed { status: u16, body: Value },

    /// `status` is `None` when the miss was detected locally, e.g. a key absent from a listing
    /// the upstream did return.
    #[error("not found: {}", not_found_source(.status))]
    NotFound {
        status: Option<u16>,
        body: Value,
        hint: Option<NotFoundHint>,
    },

    #[error("rate limited: upstream returned {status}")]
    RateLimited { status: u16, body: Value },

    #[error("upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
        body: Option<Value>,
    },

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ToolError>;

impl From<EnvError> for ToolError {
    fn from(value: EnvError) -> Self {
        match value {
            EnvError::MissingCredentials { .. } => Self::MissingCredentials(value.to_string()),
            EnvError::InvalidRegion { .. }
            | EnvError::OtherRegionWithoutUrl
            | EnvError::InvalidBaseUrl { .. } => Self::InvalidRegion(value.to_string()),
        }
    }
}

impl ToolError {
    /// Stable snake_case identifier.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::UnknownTool(_) => "unknown_tool",
            Self::MissingCredentials(_) => "missing_credentials",
            Self::InvalidRegion(_) => "invalid_region",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::NotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Upstream { .. } => "upstream_error",
            Self::Timeout { .. } => "timeout",
            Self::SchemaUnavailable(_) => "schema_unavailable",
            Self::Config(_) => "config",
        }
    }

    /// Upstream HTTP status, when the error came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } | Self::RateLimited { status, .. } => {
                Some(*status)
            }
            Self::NotFound { status, .. } | Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::AuthenticationFailed { body, .. }
            | Self::NotFound { body, .. }
            | Self::RateLimited { body, .. } => Some(body),
            Self::Upstream { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Structured form: `{"error": {"kind", "message", "status"?, "body"?, hints?}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut err = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(status) = self.status() {
            err["status"] = json!(status);
        }
        if let Some(body) = self.body() {
            err["body"] = body.clone();
        }
        if let Self::NotFound {
            hint: Some(hint), ..
        } = self
        {
            err["possible_reasons"] = json!(hint.possible_reasons);
            err["suggestions"] = json!(hint.suggestions);
        }
        json!({ "error": err })
    }

    #[must_use]
    pub fn into_call_result(self) -> CallToolResult {
        let structured = self.to_json();
        let mut text = self.to_string();
        if let Some(body) = self.body() {
            text.push_str(": ");
            text.push_str(&body_text(body));
        }
        CallToolResult {
            content: vec![Content::text(text)],
            structured_content: Some(structured),
            is_error: Some(true),
            meta: None,
        }
    }
}

fn not_found_source(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!("upstream returned {status}"),
        None => "no matching entry".to_string(),
    }
}

fn body_text(body: &Value) -> String {
    match body {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
