//! Runtime for OpenAPI-derived tool sources.
//!
//! The schema is loaded once in [`OpenApiToolSource::build`]. A source whose schema failed to
//! load or synthesize stays in the process with zero tools and remembers why.

use crate::config::{DEFAULT_SPEC_PATH, OpenApiSourceConfig};
use crate::discovery::synthesize;
use crate::error::{OpenApiToolsError, Result};
use openapiv3::OpenAPI;
use rmcp::model::{CallToolResult, Tool};
use sauce_mcp_http_tools::ToolError;
use sauce_mcp_http_tools::config::{HttpToolsConfig, UnknownArgPolicy};
use sauce_mcp_http_tools::connection::Connection;
use sauce_mcp_http_tools::relay::sanitize_reqwest_error;
use sauce_mcp_http_tools::runtime::HttpToolSource;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub struct OpenApiToolSource {
    name: String,
    state: std::result::Result<HttpToolSource, ToolError>,
}

impl OpenApiToolSource {
    /// Load, synthesize and wrap the schema. Never fails: errors are kept and logged.
    pub async fn build(
        name: impl Into<String>,
        config: OpenApiSourceConfig,
        connection: Arc<Connection>,
    ) -> Self {
        let name = name.into();
        let state = match load_and_build(&name, &config, connection).await {
            Ok(source) => {
                tracing::info!(
                    source = %name,
                    tools = source.list_tools().len(),
                    "Discovered {} tools",
                    source.list_tools().len()
                );
                Ok(source)
            }
            Err(e) => {
                let err = ToolError::from(e);
                tracing::error!(source = %name, error = %err, "OpenAPI schema unavailable; serving no tools");
                Err(err)
            }
        };
        Self { name, state }
    }

    /// Build directly from a parsed document (no I/O).
    ///
    /// # Errors
    ///
    /// Returns `SchemaUnavailable` if synthesis or tool validation fails.
    pub fn from_document(
        name: impl Into<String>,
        spec: &OpenAPI,
        config: &OpenApiSourceConfig,
        connection: Arc<Connection>,
    ) -> std::result::Result<Self, ToolError> {
        let name = name.into();
        let source = build_source(&name, spec, config, connection)?;
        Ok(Self {
            name,
            state: Ok(source),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Why the schema is unavailable, if it is.
    #[must_use]
    pub fn schema_error(&self) -> Option<&ToolError> {
        self.state.as_ref().err()
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.state
            .as_ref()
            .map(HttpToolSource::list_tools)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, tool_name: &str) -> bool {
        self.state.as_ref().is_ok_and(|s| s.contains(tool_name))
    }

    /// # Errors
    ///
    /// Returns `SchemaUnavailable` when the schema never loaded, otherwise whatever the HTTP tool
    /// runtime returns.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> sauce_mcp_http_tools::Result<CallToolResult> {
        match &self.state {
            Ok(source) => source.call_tool(tool_name, arguments).await,
            Err(e) => Err(e.clone()),
        }
    }
}

async fn load_and_build(
    name: &str,
    config: &OpenApiSourceConfig,
    connection: Arc<Connection>,
) -> Result<HttpToolSource> {
    let spec = load_spec(config, &connection).await?;
    build_source(name, &spec, config, connection)
}

fn build_source(
    name: &str,
    spec: &OpenAPI,
    config: &OpenApiSourceConfig,
    connection: Arc<Connection>,
) -> Result<HttpToolSource> {
    let tools = synthesize(spec, config)?;
    let http_config = HttpToolsConfig {
        fixed_query: config.fixed_query.clone(),
        unknown_args: UnknownArgPolicy::Reject,
        tools,
    };
    Ok(HttpToolSource::new(name, http_config, connection)?)
}

/// Where the schema comes from: the configured location, or the default path on the base URL.
///
/// # Errors
///
/// Returns the configuration error when no location is given and the base URL did not resolve.
pub fn spec_location(
    config: &OpenApiSourceConfig,
    connection: &Connection,
) -> sauce_mcp_http_tools::Result<String> {
    if let Some(spec) = config.spec.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(spec.to_string());
    }
    let upstream = connection.upstream()?;
    Ok(format!(
        "{}{DEFAULT_SPEC_PATH}",
        upstream.base_url.as_str().trim_end_matches('/')
    ))
}

/// Fetch (URL) or read (file) the schema and parse it. JSON is valid YAML, so one parser covers
/// both encodings.
///
/// # Errors
///
/// Returns fetch, read or parse errors.
pub async fn load_spec(config: &OpenApiSourceConfig, connection: &Connection) -> Result<OpenAPI> {
    let location = spec_location(config, connection)?;

    let content = if location.starts_with("http://") || location.starts_with("https://") {
        tracing::info!("Fetching OpenAPI spec from {location}");
        fetch_spec(&location, connection).await?
    } else {
        tracing::info!("Loading OpenAPI spec from {location}");
        std::fs::read_to_string(&location).map_err(|e| OpenApiToolsError::SpecReadFile {
            path: location.clone(),
            source: e,
        })?
    };

    serde_yaml::from_str(&content).map_err(|e| OpenApiToolsError::SpecParse {
        location,
        source: e,
    })
}

async fn fetch_spec(location: &str, connection: &Connection) -> Result<String> {
    let url = Url::parse(location).map_err(|e| OpenApiToolsError::SpecFetch {
        url: location.to_string(),
        message: format!("invalid URL: {e}"),
    })?;

    let mut request = connection
        .client()
        .get(url.clone())
        .timeout(connection.timeout());
    // Credentials only go to the Sauce API itself.
    if let Ok(upstream) = connection.upstream()
        && same_origin(&url, &upstream.base_url)
    {
        request = request.basic_auth(
            &upstream.credentials.username,
            Some(&upstream.credentials.access_key),
        );
    }

    let response = request
        .send()
        .await
        .map_err(|e| OpenApiToolsError::SpecFetch {
            url: location.to_string(),
            message: sanitize_reqwest_error(&e),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(OpenApiToolsError::SpecFetch {
            url: location.to_string(),
            message: format!("HTTP {status}"),
        });
    }

    response
        .text()
        .await
        .map_err(|e| OpenApiToolsError::SpecReadBody {
            url: location.to_string(),
            message: sanitize_reqwest_error(&e),
        })
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::routing::get;
    use sauce_mcp_env::SauceConfig;
    use sauce_mcp_test_support::MockUpstream;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::io::Write as _;
    use std::time::Duration;

    const SPEC: &str = r##"
openapi: "3.0.1"
info: { title: RDC, version: "2" }
servers:
  - url: /rdc/v2
paths:
  /devices/status:
    get:
      operationId: listDeviceStatus
      responses: { "200": { description: ok } }
  /sessions/{sessionId}:
    get:
      operationId: getSession
      parameters:
        - { name: sessionId, in: path, required: true, schema: { type: string } }
      responses: { "200": { description: ok } }
"##;

    fn connection(base_url: &str) -> Arc<Connection> {
        let cfg = SauceConfig {
            username: Some("u1".to_string()),
            access_key: Some("k1".to_string()),
            region: None,
            api_url: Some(base_url.to_string()),
        };
        Arc::new(Connection::new(&cfg, Duration::from_secs(5)).expect("connection"))
    }

    fn rdc_config(spec: Option<String>) -> OpenApiSourceConfig {
        OpenApiSourceConfig {
            spec,
            fixed_query: BTreeMap::from([("ai".to_string(), "rdc_mcp".to_string())]),
            ..OpenApiSourceConfig::default()
        }
    }

    #[tokio::test]
    async fn loads_default_location_with_credentials_and_calls_tools() {
        async fn spec(headers: HeaderMap) -> (StatusCode, String) {
            if headers.get("authorization").is_some() {
                (StatusCode::OK, SPEC.to_string())
            } else {
                (StatusCode::UNAUTHORIZED, String::new())
            }
        }
        async fn session(uri: Uri) -> axum::Json<Value> {
            axum::Json(json!({"path": uri.path(), "query": uri.query()}))
        }
        let app = Router::new()
            .route("/rdc/v2/openapi.yaml", get(spec))
            .route("/rdc/v2/sessions/{id}", get(session));
        let mock = MockUpstream::start(app).await;

        let source = OpenApiToolSource::build("rdc", rdc_config(None), connection(&mock.base_url())).await;
        assert!(source.schema_error().is_none(), "{:?}", source.schema_error());
        let names: Vec<String> = source.list_tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, vec!["list_device_status", "get_session"]);

        let result = source
            .call_tool("get_session", json!({"sessionId": "s1"}))
            .await
            .expect("call");
        let text = serde_json::to_value(&result).expect("serialize")["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .expect("text");
        let body: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(body, json!({"path": "/rdc/v2/sessions/s1", "query": "ai=rdc_mcp"}));
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_schema_file_yields_zero_tools() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"openapi: [this is: not, a document")
            .expect("write");

        let source = OpenApiToolSource::build(
            "rdc",
            rdc_config(Some(file.path().display().to_string())),
            connection("http://127.0.0.1:1"),
        )
        .await;

        assert!(source.list_tools().is_empty());
        assert!(!source.contains("list_device_status"));
        let err = source.schema_error().expect("schema error");
        assert_eq!(err.kind(), "schema_unavailable");

        let call = source.call_tool("list_device_status", json!({})).await.unwrap_err();
        assert_eq!(call.kind(), "schema_unavailable");
    }

    #[tokio::test]
    async fn schema_file_is_loaded_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SPEC.as_bytes()).expect("write");

        let source = OpenApiToolSource::build(
            "rdc",
            rdc_config(Some(file.path().display().to_string())),
            connection("http://127.0.0.1:1"),
        )
        .await;
        assert_eq!(source.list_tools().len(), 2);
        assert!(source.contains("get_session"));
    }

    #[tokio::test]
    async fn proxy_target_path_is_forwarded_as_segments() {
        const PROXY: &str = r##"
openapi: "3.0.1"
info: { title: RDC, version: "2" }
servers:
  - url: /rdc/v2
paths:
  /sessions/{sessionId}/device/proxy/http/{targetHost}/{targetPort}/{targetPath}:
    get:
      operationId: forwardHttpGet
      parameters:
        - { name: sessionId, in: path, required: true, schema: { type: string } }
        - { name: targetHost, in: path, required: true, schema: { type: string } }
        - { name: targetPort, in: path, required: true, schema: { type: string } }
        - { name: targetPath, in: path, required: true, schema: { type: string } }
      responses: { "200": { description: ok } }
"##;
        async fn forward(uri: Uri) -> axum::Json<Value> {
            axum::Json(json!({"path": uri.path()}))
        }
        let app = Router::new().route("/rdc/v2/sessions/{id}/device/proxy/http/{*rest}", get(forward));
        let mock = MockUpstream::start(app).await;

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(PROXY.as_bytes()).expect("write");
        let source = OpenApiToolSource::build(
            "rdc",
            rdc_config(Some(file.path().display().to_string())),
            connection(&mock.base_url()),
        )
        .await;

        let args = |target: &str| {
            json!({
                "sessionId": "s1",
                "targetHost": "localhost",
                "targetPort": "8080",
                "targetPath": target,
            })
        };
        let result = source
            .call_tool("forward_http_get", args("api/v1/status"))
            .await
            .expect("call");
        let text = serde_json::to_value(&result).expect("serialize")["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .expect("text");
        let body: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(
            body["path"],
            "/rdc/v2/sessions/s1/device/proxy/http/localhost/8080/api/v1/status"
        );

        let err = source
            .call_tool("forward_http_get", args("api/../../admin"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert_eq!(mock.hits(), 1);
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn fetch_failure_yields_zero_tools() {
        let mock = MockUpstream::start(Router::new()).await;
        let source = OpenApiToolSource::build("rdc", rdc_config(None), connection(&mock.base_url())).await;
        assert!(source.list_tools().is_empty());
        assert!(
            source
                .schema_error()
                .is_some_and(|e| e.to_string().contains("404"))
        );
        mock.shutdown().await;
    }

    #[test]
    fn credentials_stay_on_the_sauce_origin() {
        let base = Url::parse("https://api.us-west-1.saucelabs.com").expect("url");
        assert!(same_origin(
            &Url::parse("https://api.us-west-1.saucelabs.com/rdc/v2/openapi.yaml").expect("url"),
            &base
        ));
        assert!(!same_origin(
            &Url::parse("https://specs.example.com/rdc.yaml").expect("url"),
            &base
        ));
    }
}
