//! Outbound HTTP state shared by every tool source in a process.
//!
//! A `Connection` owns the single `reqwest::Client`, the per-request timeout and the result of
//! resolving `SauceConfig` once at start. A failed resolution is kept and reported on every call,
//! before any network activity.

use crate::error::{Result, ToolError};
use crate::relay::{encode_component, sanitize_reqwest_error};
use reqwest::{Client, Method, StatusCode};
use sauce_mcp_env::{EnvError, SauceConfig, Upstream};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct Connection {
    client: Client,
    upstream: std::result::Result<Upstream, EnvError>,
    timeout: Duration,
}

/// A fully mapped request, relative to the upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Already percent-encoded path, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: &[(String, String)]) -> Self {
        self.query.extend_from_slice(query);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Connection {
    /// Build the shared client and resolve the configuration.
    ///
    /// Resolution failures are not returned here; they surface on each call.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the timeout is zero or the HTTP client cannot be built.
    pub fn new(config: &SauceConfig, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(ToolError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        let client = Client::builder()
            .user_agent(concat!("sauce-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            upstream: config.resolve(),
            timeout,
        })
    }

    /// The resolved upstream.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` or `InvalidRegion` when resolution failed at start.
    pub fn upstream(&self) -> Result<&Upstream> {
        self.upstream
            .as_ref()
            .map_err(|e| ToolError::from(e.clone()))
    }

    /// The configuration error, if resolution failed (for startup diagnostics).
    #[must_use]
    pub fn deferred_error(&self) -> Option<&EnvError> {
        self.upstream.as_ref().err()
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one request with Basic auth and the configured timeout. Single attempt.
    ///
    /// Non-2xx statuses are returned as-is; see [`crate::relay::check_status`].
    ///
    /// # Errors
    ///
    /// Returns configuration errors, `Timeout` when the deadline passes, and `Upstream` (without
    /// a status) for transport failures.
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse> {
        let upstream = self.upstream()?;
        let url = build_url(&upstream.base_url, &request.path, &request.query)?;

        debug!(method = %request.method, path = %request.path, "upstream request");

        let mut builder = self
            .client
            .request(request.method, url)
            .basic_auth(
                &upstream.credentials.username,
                Some(&upstream.credentials.access_key),
            )
            .timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    fn transport_error(&self, e: &reqwest::Error) -> ToolError {
        if e.is_timeout() {
            ToolError::Timeout {
                after: self.timeout,
            }
        } else {
            ToolError::Upstream {
                status: None,
                message: sanitize_reqwest_error(e),
                body: None,
            }
        }
    }
}

fn build_url(base_url: &Url, path: &str, query: &[(String, String)]) -> Result<Url> {
    let joined = format!("{}{}", base_url.as_str().trim_end_matches('/'), path);
    let mut url = Url::parse(&joined)
        .map_err(|e| ToolError::InvalidArgument(format!("invalid request URL: {e}")))?;

    if !query.is_empty() {
        let encoded = query
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&encoded));
    }

    Ok(url)
}
