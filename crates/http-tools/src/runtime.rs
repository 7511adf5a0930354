//! Runtime for declaratively configured HTTP tools.
//!
//! An `HttpToolSource` turns a list of [`ToolSpec`]s into MCP tools and executes `tools/call` by
//! mapping arguments onto exactly one upstream request. Argument validation always runs before
//! anything touches the network.

use crate::config::{
    ContextValue, HttpToolsConfig, NotFoundHint, ParamLocation, ParamSpec, ResponseMode,
    ResponseSpec, ToolSpec, UnknownArgPolicy,
};
use crate::connection::{Connection, UpstreamRequest};
use crate::error::{Result, ToolError};
use crate::relay::{self, encode_component};
use crate::response_shaping::{CompiledResponsePipeline, compile_pipeline, render_template};
use reqwest::Method;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use sauce_mcp_env::Upstream;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct GeneratedTool {
    name: String,
    description: String,
    method: Method,
    path: String,
    params: Vec<ParamSpec>,
    input_schema: Arc<JsonObject>,
    response: ResponseSpec,
    pipeline: Arc<CompiledResponsePipeline>,
    not_found: Option<NotFoundHint>,
}

struct RequestParts {
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

#[derive(Clone)]
pub struct HttpToolSource {
    inner: Arc<HttpToolSourceInner>,
}

struct HttpToolSourceInner {
    name: String,
    tools: Vec<GeneratedTool>,
    fixed_query: Vec<(String, String)>,
    unknown_args: UnknownArgPolicy,
    connection: Arc<Connection>,
}

impl HttpToolSource {
    /// Build a tool source from a static config.
    ///
    /// The resulting instance is immutable and safe to share across tasks.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a tool is invalid: duplicate tool or parameter names, an invalid HTTP
    /// method, a path placeholder without a matching path parameter (or the reverse), a hidden
    /// parameter without a context fallback, or an invalid response transform.
    pub fn new(
        name: impl Into<String>,
        config: HttpToolsConfig,
        connection: Arc<Connection>,
    ) -> Result<Self> {
        let name = name.into();
        let tools = generate_tools(&name, &config.tools)?;

        Ok(Self {
            inner: Arc::new(HttpToolSourceInner {
                name,
                tools,
                fixed_query: config.fixed_query.into_iter().collect(),
                unknown_args: config.unknown_args,
                connection,
            }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<Connection> {
        &self.inner.connection
    }

    #[must_use]
    pub fn fixed_query(&self) -> &[(String, String)] {
        &self.inner.fixed_query
    }

    /// List the MCP `Tool`s exposed by this source.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner
            .tools
            .iter()
            .map(|t| {
                let mut tool = Tool::new(
                    t.name.clone(),
                    t.description.clone(),
                    t.input_schema.clone(),
                );
                tool.annotations = Some(crate::semantics::annotations_for(&t.method, &t.name));
                tool
            })
            .collect()
    }

    #[must_use]
    pub fn contains(&self, tool_name: &str) -> bool {
        self.inner.tools.iter().any(|t| t.name == tool_name)
    }

    /// Execute a tool call against this source.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `UnknownTool` if the name is not declared here
    /// - `InvalidArgument` for non-object arguments, unknown arguments (under `Reject`), missing
    ///   required arguments or type mismatches, without any network call
    /// - `MissingCredentials` / `InvalidRegion` if the configuration did not resolve
    /// - the relay's status errors, `Timeout`, or `Upstream` for transport failures
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<CallToolResult> {
        let tool = self
            .inner
            .tools
            .iter()
            .find(|t| t.name == tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        let mut resolved = resolve_arguments(tool, &arguments, self.inner.unknown_args)?;
        let upstream = self.inner.connection.upstream()?;
        apply_context(tool, &mut resolved, upstream);

        let parts = build_request_parts(tool, &resolved)?;
        let mut query = parts.query;
        query.extend(self.inner.fixed_query.iter().cloned());

        debug!(
            source = %self.inner.name,
            tool = %tool.name,
            method = %tool.method,
            path = %tool.path,
            "calling HTTP tool"
        );

        let response = self
            .inner
            .connection
            .send(UpstreamRequest {
                method: tool.method.clone(),
                path: parts.path,
                query,
                headers: parts.headers,
                body: parts.body,
            })
            .await?;
        let response = relay::check_status(response, tool.not_found.as_ref())?;

        match tool.response.mode {
            ResponseMode::Json => {
                let mut body = relay::body_value(&response);
                tool.pipeline.apply_to_value(&mut body, &resolved);
                Ok(success(&body))
            }
            ResponseMode::Text => Ok(CallToolResult::success(vec![Content::text(
                relay::body_text(&response),
            )])),
            ResponseMode::Asset => {
                let filename = tool
                    .response
                    .asset_filename
                    .as_deref()
                    .map_or_else(|| tool.name.clone(), |t| render_template(t, &resolved));
                Ok(success(&relay::asset_value(&response, &filename)))
            }
        }
    }
}

/// Successful result carrying a JSON body as text content.
#[must_use]
pub fn success(body: &Value) -> CallToolResult {
    let text = match body {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    };
    CallToolResult::success(vec![Content::text(text)])
}

fn generate_tools(source_name: &str, specs: &[ToolSpec]) -> Result<Vec<GeneratedTool>> {
    let mut out = Vec::with_capacity(specs.len());
    let mut names: HashSet<&str> = HashSet::new();

    for spec in specs {
        if !names.insert(spec.name.as_str()) {
            return Err(ToolError::Config(format!(
                "Duplicate tool name '{}' in HTTP tool source '{source_name}'",
                spec.name
            )));
        }

        let method = parse_http_method(source_name, &spec.name, &spec.method)?;
        validate_params(source_name, spec)?;

        let pipeline = compile_pipeline(&spec.response.transforms).map_err(|e| {
            ToolError::Config(format!(
                "Invalid response transforms for tool '{}' in HTTP tool source '{source_name}': {e}",
                spec.name
            ))
        })?;

        let mut path = spec.path.clone();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        out.push(GeneratedTool {
            name: spec.name.clone(),
            description: spec.description.clone(),
            method,
            path,
            params: spec.params.clone(),
            input_schema: Arc::new(build_input_schema(&spec.params)),
            response: spec.response.clone(),
            pipeline,
            not_found: spec.not_found.clone(),
        });
    }

    Ok(out)
}

fn parse_http_method(source_name: &str, tool_name: &str, method: &str) -> Result<Method> {
    let method_str = method.trim();
    method_str.to_uppercase().parse().map_err(|_| {
        ToolError::Config(format!(
            "Invalid HTTP method '{method_str}' in tool '{tool_name}' (source '{source_name}')"
        ))
    })
}

fn validate_params(source_name: &str, spec: &ToolSpec) -> Result<()> {
    let config_err = |msg: String| {
        ToolError::Config(format!(
            "{msg} in tool '{}' (source '{source_name}')",
            spec.name
        ))
    };

    let mut seen: HashSet<&str> = HashSet::new();
    for p in &spec.params {
        if !seen.insert(p.name.as_str()) {
            return Err(config_err(format!("Duplicate param '{}'", p.name)));
        }
        if p.hidden && p.fallback.is_none() {
            return Err(config_err(format!(
                "Hidden param '{}' has no context fallback",
                p.name
            )));
        }
        if p.location == ParamLocation::Path && !spec.path.contains(&format!("{{{}}}", p.wire_name()))
        {
            return Err(config_err(format!(
                "Path param '{}' has no '{{{}}}' placeholder",
                p.name,
                p.wire_name()
            )));
        }
    }

    for placeholder in path_placeholders(&spec.path) {
        let covered = spec
            .params
            .iter()
            .any(|p| p.location == ParamLocation::Path && p.wire_name() == placeholder);
        if !covered {
            return Err(config_err(format!(
                "Path placeholder '{{{placeholder}}}' has no path param"
            )));
        }
    }

    Ok(())
}

fn path_placeholders(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    out
}

/// Validate caller arguments and fill declared defaults. Context fallbacks are applied later.
fn resolve_arguments(
    tool: &GeneratedTool,
    arguments: &Value,
    policy: UnknownArgPolicy,
) -> Result<Map<String, Value>> {
    let args = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(ToolError::InvalidArgument(format!(
                "arguments must be a JSON object, got {}",
                json_type_name(other)
            )));
        }
    };

    let accepted: Vec<&str> = tool
        .params
        .iter()
        .filter(|p| !p.hidden)
        .map(|p| p.name.as_str())
        .collect();
    let unknown: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|k| !accepted.contains(k))
        .collect();
    if !unknown.is_empty() {
        match policy {
            UnknownArgPolicy::Reject => {
                return Err(ToolError::InvalidArgument(format!(
                    "unknown argument(s) {} for tool '{}'; accepted: [{}]",
                    unknown.join(", "),
                    tool.name,
                    accepted.join(", ")
                )));
            }
            UnknownArgPolicy::Ignore => {
                debug!(tool = %tool.name, unknown = ?unknown, "ignoring unknown arguments");
            }
        }
    }

    let mut resolved = Map::new();
    let mut missing: Vec<&str> = Vec::new();
    for p in tool.params.iter().filter(|p| !p.hidden) {
        let value = args
            .get(&p.name)
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| p.default.clone());
        match value {
            Some(v) => {
                check_type(p, &v)?;
                if p.location == ParamLocation::Path {
                    check_path_value(p, &v)?;
                }
                resolved.insert(p.name.clone(), v);
            }
            None if p.is_required() && p.fallback.is_none() => missing.push(&p.name),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(ToolError::InvalidArgument(format!(
            "missing required argument(s): {}",
            missing.join(", ")
        )));
    }

    Ok(resolved)
}

fn apply_context(tool: &GeneratedTool, resolved: &mut Map<String, Value>, upstream: &Upstream) {
    for p in &tool.params {
        if resolved.contains_key(&p.name) {
            continue;
        }
        if let Some(ContextValue::Username) = p.fallback {
            resolved.insert(
                p.name.clone(),
                Value::String(upstream.credentials.username.clone()),
            );
        }
    }
}

/// Path values are substituted into the URL, so empty and dot segments would change which
/// resource the request addresses.
fn check_path_value(param: &ParamSpec, value: &Value) -> Result<()> {
    let raw = value_to_string(value);
    let invalid = if param.allow_reserved {
        let trimmed = raw.strip_prefix('/').unwrap_or(&raw);
        let segments: Vec<&str> = trimmed.split('/').collect();
        let last = segments.len() - 1;
        trimmed.is_empty()
            || segments
                .iter()
                .enumerate()
                .any(|(i, seg)| *seg == "." || *seg == ".." || (seg.is_empty() && i != last))
    } else {
        raw.is_empty() || raw == "." || raw == ".."
    };
    if invalid {
        return Err(ToolError::InvalidArgument(format!(
            "path argument '{}' must not be empty or contain '.' or '..' segments, got {raw:?}",
            param.name
        )));
    }
    Ok(())
}

fn check_type(param: &ParamSpec, value: &Value) -> Result<()> {
    let schema = param.schema.as_ref();
    // No schema means a plain string; a schema without `type` accepts anything.
    let expected = match schema {
        None => "string",
        Some(s) => s.get("type").and_then(Value::as_str).unwrap_or("any"),
    };

    let mismatch = || {
        ToolError::InvalidArgument(format!(
            "argument '{}' must be of type {expected}, got {}",
            param.name,
            json_type_name(value)
        ))
    };

    match expected {
        "array" => {
            let items = value.as_array().ok_or_else(mismatch)?;
            let item_type = schema
                .and_then(|s| s.pointer("/items/type"))
                .and_then(Value::as_str);
            for item in items {
                let ok = match item_type {
                    Some(t) => scalar_matches(t, item),
                    None => !item.is_array() && !item.is_object(),
                };
                if !ok {
                    return Err(ToolError::InvalidArgument(format!(
                        "argument '{}' must be an array of {}, got an element of type {}",
                        param.name,
                        item_type.unwrap_or("scalars"),
                        json_type_name(item)
                    )));
                }
            }
        }
        "object" => {
            if !value.is_object() {
                return Err(mismatch());
            }
        }
        scalar => {
            if !scalar_matches(scalar, value) {
                return Err(mismatch());
            }
        }
    }

    if let Some(allowed) = schema.and_then(|s| s.get("enum")).and_then(Value::as_array)
        && !allowed.contains(value)
    {
        let allowed = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ToolError::InvalidArgument(format!(
            "argument '{}' must be one of [{allowed}]",
            param.name
        )));
    }

    Ok(())
}

fn scalar_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn build_request_parts(tool: &GeneratedTool, resolved: &Map<String, Value>) -> Result<RequestParts> {
    let mut path = tool.path.clone();
    let mut query = Vec::new();
    let mut headers = Vec::new();
    let mut body_fields = Map::new();
    let mut body_payload = None;

    for p in &tool.params {
        let Some(value) = resolved.get(&p.name) else {
            continue;
        };
        match p.location {
            ParamLocation::Path => {
                let raw = value_to_string(value);
                let encoded = if p.allow_reserved {
                    let trimmed = raw.strip_prefix('/').unwrap_or(&raw);
                    trimmed.split('/').map(encode_component).collect::<Vec<_>>().join("/")
                } else {
                    encode_component(&raw)
                };
                path = path.replace(&format!("{{{}}}", p.wire_name()), &encoded);
            }
            ParamLocation::Query => serialize_query_param(p, value, &mut query),
            ParamLocation::Header => headers.push((p.wire_name().to_string(), value_to_string(value))),
            ParamLocation::Body => {
                if p.name == "body" && p.wire_name() == "body" {
                    body_payload = Some(value.clone());
                } else {
                    body_fields.insert(p.wire_name().to_string(), value.clone());
                }
            }
        }
    }

    if let Some(unfilled) = path_placeholders(&path).first() {
        return Err(ToolError::InvalidArgument(format!(
            "missing path argument '{unfilled}'"
        )));
    }

    let body = body_payload.or_else(|| (!body_fields.is_empty()).then_some(Value::Object(body_fields)));

    Ok(RequestParts {
        path,
        query,
        headers,
        body,
    })
}

/// Form style, exploded: arrays repeat the key. Empty optional values are omitted.
fn serialize_query_param(param: &ParamSpec, value: &Value, out: &mut Vec<(String, String)>) {
    let name = param.wire_name();
    match value {
        Value::Array(items) => {
            for item in items {
                out.push((name.to_string(), value_to_string(item)));
            }
        }
        Value::String(s) if s.is_empty() && !param.is_required() => {}
        other => out.push((name.to_string(), value_to_string(other))),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn build_input_schema(params: &[ParamSpec]) -> JsonObject {
    let mut properties = Map::new();
    let mut required: Vec<&str> = Vec::new();

    for p in params.iter().filter(|p| !p.hidden) {
        let mut prop = p
            .schema
            .clone()
            .unwrap_or_else(|| json!({"type": "string"}));
        if let Some(obj) = prop.as_object_mut() {
            if let Some(desc) = &p.description {
                obj.insert("description".to_string(), json!(desc));
            }
            if let Some(default) = &p.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        properties.insert(p.name.clone(), prop);

        if p.is_required() && p.default.is_none() && p.fallback.is_none() {
            required.push(&p.name);
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::HttpToolSource;
    use crate::config::{
        ContextValue, HttpToolsConfig, ParamSpec, ResponseTransform, ToolSpec, UnknownArgPolicy,
    };
    use crate::connection::Connection;
    use axum::Router;
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::routing::any;
    use sauce_mcp_env::SauceConfig;
    use sauce_mcp_test_support::MockUpstream;
    use serde_json::{Value, json};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use std::time::Duration;

    fn connection(base_url: &str) -> Arc<Connection> {
        let cfg = SauceConfig {
            username: Some("u1".to_string()),
            access_key: Some("k1".to_string()),
            region: None,
            api_url: Some(base_url.to_string()),
        };
        Arc::new(Connection::new(&cfg, Duration::from_secs(5)).expect("connection"))
    }

    fn source(base_url: &str, tools: Vec<ToolSpec>) -> HttpToolSource {
        let cfg = HttpToolsConfig {
            fixed_query: BTreeMap::from([("ai".to_string(), "mcp".to_string())]),
            unknown_args: UnknownArgPolicy::Reject,
            tools,
        };
        HttpToolSource::new("test", cfg, connection(base_url)).expect("valid config")
    }

    fn text_of(result: &rmcp::model::CallToolResult) -> String {
        let v = serde_json::to_value(result).expect("CallToolResult serializes");
        v.get("content")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .expect("content[0].text")
            .to_string()
    }

    async fn echo_handler(method: Method, uri: Uri, headers: HeaderMap, body: String) -> axum::Json<Value> {
        axum::Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query().unwrap_or(""),
            "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()),
            "body": body,
        }))
    }

    fn echo_app() -> Router {
        Router::new().route("/{*path}", any(echo_handler))
    }

    #[test]
    fn list_tools_builds_required_and_defaults_in_schema() {
        let src = source(
            "http://127.0.0.1:1",
            vec![
                ToolSpec::get("get_job", "/rest/v1/{username}/jobs/{job_id}", "Get a job")
                    .param(ParamSpec::path("username").from_context(ContextValue::Username))
                    .param(ParamSpec::path("job_id").describe("Job id"))
                    .param(ParamSpec::query("limit").integer().default_value(json!(5))),
            ],
        );
        let tools = src.list_tools();
        assert_eq!(tools.len(), 1);

        let schema = &tools[0].input_schema;
        assert_eq!(schema.get("required"), Some(&json!(["job_id"])));
        let props = schema
            .get("properties")
            .and_then(Value::as_object)
            .expect("properties");
        assert!(!props.contains_key("username"));
        assert_eq!(props["limit"]["default"], 5);
        assert_eq!(props["job_id"]["description"], "Job id");
        assert_eq!(
            tools[0].annotations.as_ref().and_then(|a| a.read_only_hint),
            Some(true)
        );
    }

    #[test]
    fn invalid_declarations_are_rejected() {
        let conn = connection("http://127.0.0.1:1");
        let dup = HttpToolsConfig {
            tools: vec![
                ToolSpec::get("a", "/x", ""),
                ToolSpec::get("a", "/y", ""),
            ],
            ..HttpToolsConfig::default()
        };
        let err = HttpToolSource::new("t", dup, conn.clone()).err().expect("dup");
        assert!(err.to_string().contains("Duplicate tool name 'a'"));

        let uncovered = HttpToolsConfig {
            tools: vec![ToolSpec::get("b", "/teams/{id}", "")],
            ..HttpToolsConfig::default()
        };
        let err = HttpToolSource::new("t", uncovered, conn.clone()).err().expect("uncovered");
        assert!(err.to_string().contains("{id}"));

        let hidden = HttpToolsConfig {
            tools: vec![ToolSpec::get("c", "/x", "").param(ParamSpec {
                hidden: true,
                ..ParamSpec::query("q")
            })],
            ..HttpToolsConfig::default()
        };
        assert!(HttpToolSource::new("t", hidden, conn).is_err());
    }

    #[tokio::test]
    async fn call_tool_builds_path_query_and_basic_auth() {
        let mock = MockUpstream::start(echo_app()).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("lookup_builds", "/v2/builds/{build_source}/", "")
                    .param(ParamSpec::path("build_source").default_value(json!("vdc")))
                    .param(ParamSpec::query("status").string_array())
                    .param(ParamSpec::query("limit").integer())
                    .param(ParamSpec::query("name"))
                    .param(ParamSpec::query("public").boolean()),
            ],
        );

        let result = src
            .call_tool(
                "lookup_builds",
                json!({"status": ["success", "failed"], "limit": 3, "name": "", "public": false}),
            )
            .await
            .expect("call_tool");
        let echoed: Value = serde_json::from_str(&text_of(&result)).expect("echo json");

        assert_eq!(echoed["method"], "GET");
        assert_eq!(echoed["path"], "/v2/builds/vdc/");
        assert_eq!(
            echoed["query"],
            "status=success&status=failed&limit=3&public=false&ai=mcp"
        );
        // base64("u1:k1")
        assert_eq!(echoed["authorization"], "Basic dTE6azE=");
        assert_eq!(mock.hits(), 1);
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn context_fallback_fills_username_and_path_is_encoded() {
        let mock = MockUpstream::start(echo_app()).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("get_tunnel", "/rest/v1/{username}/tunnels/{tunnel_id}", "")
                    .param(ParamSpec::path("username").or_context(ContextValue::Username))
                    .param(ParamSpec::path("tunnel_id")),
            ],
        );

        let own = src
            .call_tool("get_tunnel", json!({"tunnel_id": "t 1"}))
            .await
            .expect("call");
        let echoed: Value = serde_json::from_str(&text_of(&own)).expect("json");
        assert_eq!(echoed["path"], "/rest/v1/u1/tunnels/t%201");

        let other = src
            .call_tool("get_tunnel", json!({"tunnel_id": "t2", "username": "someone"}))
            .await
            .expect("call");
        let echoed: Value = serde_json::from_str(&text_of(&other)).expect("json");
        assert_eq!(echoed["path"], "/rest/v1/someone/tunnels/t2");
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_upstream() {
        let mock = MockUpstream::start(echo_app()).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("get_team", "/team-management/v1/teams/{id}", "")
                    .param(ParamSpec::path("id"))
                    .param(ParamSpec::query("limit").integer())
                    .param(ParamSpec::query("sort").one_of(&["asc", "desc"])),
            ],
        );

        let cases = [
            json!({}),
            json!({"id": null}),
            json!({"id": "t1", "bogus": 1}),
            json!({"id": "t1", "limit": "5"}),
            json!({"id": "t1", "sort": "sideways"}),
            json!(["t1"]),
        ];
        for args in cases {
            let err = src.call_tool("get_team", args.clone()).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_argument", "args {args}");
        }
        assert_eq!(mock.hits(), 0);

        let err = src.call_tool("nope", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "unknown_tool");
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn empty_and_dot_path_values_never_reach_upstream() {
        let mock = MockUpstream::start(echo_app()).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("get_job", "/rest/v1/{username}/jobs/{job_id}", "")
                    .param(ParamSpec::path("username").or_context(ContextValue::Username))
                    .param(ParamSpec::path("job_id")),
                ToolSpec::get("forward", "/proxy/{host}/{target_path}", "")
                    .param(ParamSpec::path("host"))
                    .param(ParamSpec::path("target_path").allow_reserved()),
            ],
        );

        for job_id in ["", ".", ".."] {
            let err = src
                .call_tool("get_job", json!({ "job_id": job_id }))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_argument", "job_id {job_id:?}");
        }
        let err = src
            .call_tool("get_job", json!({"job_id": "j1", "username": ".."}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");

        for target in ["", "/", "a/../b", "./a", "a//b", ".."] {
            let err = src
                .call_tool("forward", json!({"host": "h", "target_path": target}))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_argument", "target_path {target:?}");
        }
        assert_eq!(mock.hits(), 0);

        // Dots inside a segment are ordinary characters.
        let ok = src
            .call_tool("get_job", json!({"job_id": "..j1"}))
            .await
            .expect("call");
        let echoed: Value = serde_json::from_str(&text_of(&ok)).expect("json");
        assert_eq!(echoed["path"], "/rest/v1/u1/jobs/..j1");
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn multi_segment_path_keeps_slashes_and_encodes_segments() {
        let mock = MockUpstream::start(echo_app()).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("forward", "/proxy/{host}/{target_path}", "")
                    .param(ParamSpec::path("host"))
                    .param(ParamSpec::path("target_path").allow_reserved()),
            ],
        );

        let result = src
            .call_tool("forward", json!({"host": "a/b", "target_path": "/api/v 1/status"}))
            .await
            .expect("call");
        let echoed: Value = serde_json::from_str(&text_of(&result)).expect("json");
        assert_eq!(echoed["path"], "/proxy/a%2Fb/api/v%201/status");

        let trailing = src
            .call_tool("forward", json!({"host": "h", "target_path": "api/"}))
            .await
            .expect("call");
        let echoed: Value = serde_json::from_str(&text_of(&trailing)).expect("json");
        assert_eq!(echoed["path"], "/proxy/h/api/");
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn ignore_policy_drops_unknown_arguments() {
        let mock = MockUpstream::start(echo_app()).await;
        let cfg = HttpToolsConfig {
            unknown_args: UnknownArgPolicy::Ignore,
            tools: vec![ToolSpec::get("status", "/v1/rdc/devices/status", "")],
            ..HttpToolsConfig::default()
        };
        let src = HttpToolSource::new("t", cfg, connection(&mock.base_url())).expect("source");
        let result = src
            .call_tool("status", json!({"extra": true}))
            .await
            .expect("call");
        let echoed: Value = serde_json::from_str(&text_of(&result)).expect("json");
        assert_eq!(echoed["query"], "");
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn non_success_statuses_map_to_errors() {
        async fn status_handler(uri: Uri) -> (StatusCode, axum::Json<Value>) {
            let code: u16 = uri
                .path()
                .trim_start_matches("/status/")
                .parse()
                .unwrap_or(500);
            (
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                axum::Json(json!({"code": code})),
            )
        }
        let mock = MockUpstream::start(Router::new().route("/status/{code}", any(status_handler))).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("status", "/status/{code}", "")
                    .param(ParamSpec::path("code"))
                    .not_found(&["Team ID does not exist"], &["Use lookup_teams"]),
            ],
        );

        let expected = HashMap::from([
            ("401", "authentication_failed"),
            ("403", "authentication_failed"),
            ("404", "not_found"),
            ("429", "rate_limited"),
            ("500", "upstream_error"),
            ("503", "upstream_error"),
        ]);
        for (code, kind) in &expected {
            let err = src
                .call_tool("status", json!({"code": code}))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), *kind);
            assert_eq!(err.status().map(|s| s.to_string()).as_deref(), Some(*code));
            assert_eq!(
                err.body().and_then(|b| b.get("code")).and_then(Value::as_u64),
                code.parse::<u64>().ok()
            );
            let structured = err.to_json();
            if *kind == "not_found" {
                assert_eq!(structured["error"]["possible_reasons"][0], "Team ID does not exist");
            }
        }
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn transforms_apply_to_successful_bodies() {
        async fn jobs() -> axum::Json<Value> {
            axum::Json(json!([{"id": "j1", "start_time": 1_700_000_000}]))
        }
        let mock = MockUpstream::start(Router::new().route("/rest/v1/{user}/jobs", any(jobs))).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("get_recent_jobs", "/rest/v1/{username}/jobs", "")
                    .param(ParamSpec::path("username").from_context(ContextValue::Username))
                    .param(ParamSpec::query("limit").integer().default_value(json!(5)))
                    .transform(ResponseTransform::EpochToTimestamp {
                        fields: vec!["start_time".to_string()],
                    })
                    .transform(ResponseTransform::Envelope {
                        field: "jobs".to_string(),
                        count_field: Some("total".to_string()),
                        echo: BTreeMap::from([("per_page".to_string(), "limit".to_string())]),
                        constants: serde_json::Map::from_iter([("page".to_string(), json!(1))]),
                    }),
            ],
        );

        let result = src.call_tool("get_recent_jobs", Value::Null).await.expect("call");
        let body: Value = serde_json::from_str(&text_of(&result)).expect("json");
        assert_eq!(
            body,
            json!({
                "jobs": [{"id": "j1", "start_time": "2023-11-14T22:13:20Z"}],
                "total": 1,
                "page": 1,
                "per_page": 5
            })
        );
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn asset_mode_returns_base64_envelope() {
        async fn asset() -> ([(axum::http::HeaderName, &'static str); 1], &'static [u8]) {
            (
                [(axum::http::header::CONTENT_TYPE, "image/png")],
                &[0x89, 0x50, 0x4e, 0x47],
            )
        }
        let mock = MockUpstream::start(Router::new().route("/v1/rdc/jobs/{id}/{asset}", any(asset))).await;
        let src = source(
            &mock.base_url(),
            vec![
                ToolSpec::get("get_asset", "/v1/rdc/jobs/{job_id}/{asset_type}", "")
                    .param(ParamSpec::path("job_id"))
                    .param(ParamSpec::path("asset_type"))
                    .asset("{job_id}_{asset_type}"),
            ],
        );

        let result = src
            .call_tool("get_asset", json!({"job_id": "j9", "asset_type": "screenshots"}))
            .await
            .expect("call");
        let body: Value = serde_json::from_str(&text_of(&result)).expect("json");
        assert_eq!(body["encoding"], "base64");
        assert_eq!(body["content"], "iVBORw==");
        assert_eq!(body["content_type"], "image/png");
        assert_eq!(body["filename"], "j9_screenshots");
        assert_eq!(body["size"], 4);
        mock.shutdown().await;
    }
}
