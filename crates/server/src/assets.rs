//! Job asset file tools.
//!
//! Each tool resolves a file name through the job's asset listing, then downloads that file.
//! That is two upstream requests, so these tools are not expressible as a single [`ToolSpec`].
//!
//! [`ToolSpec`]: sauce_mcp_http_tools::config::ToolSpec

use crate::catalog::{TEST_ASSETS_REASONS, TEST_ASSETS_SUGGESTIONS};
use crate::registry::ToolProvider;
use async_trait::async_trait;
use reqwest::Method;
use rmcp::model::{CallToolResult, Content, Tool};
use sauce_mcp_http_tools::ToolError;
use sauce_mcp_http_tools::config::NotFoundHint;
use sauce_mcp_http_tools::connection::{Connection, UpstreamRequest};
use sauce_mcp_http_tools::relay::{self, encode_component};
use sauce_mcp_http_tools::runtime::success;
use sauce_mcp_http_tools::semantics::annotations_for;
use serde_json::{Map, Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Json,
    Text,
}

struct AssetFileTool {
    name: &'static str,
    description: &'static str,
    /// Key in the job's asset listing.
    asset_key: &'static str,
    payload: Payload,
}

static ASSET_FILE_TOOLS: [AssetFileTool; 4] = [
    AssetFileTool {
        name: "get_log_json_file",
        description: "Shows the complete log of a Sauce Labs test in structured JSON format: \
                      commands, timing and screenshots. Virtual Device Cloud (VDC) jobs only; for \
                      Real Device Cloud jobs use get_specific_real_device_job_asset with \
                      asset_type 'appiumLogs' or 'deviceLogs'.",
        asset_key: "sauce-log",
        payload: Payload::Json,
    },
    AssetFileTool {
        name: "get_network_har_file",
        description: "Returns the HAR file of network traffic gathered during the test, in \
                      structured JSON format.",
        asset_key: "network.har",
        payload: Payload::Json,
    },
    AssetFileTool {
        name: "get_selenium_log_file",
        description: "Shows the complete log of a Sauce Labs test, in unstructured raw format.",
        asset_key: "selenium-server.log",
        payload: Payload::Text,
    },
    AssetFileTool {
        name: "get_performance_json_file",
        description: "Returns the performance log of the test, in structured JSON format.",
        asset_key: "performance.json",
        payload: Payload::Json,
    },
];

pub struct AssetFileTools {
    connection: Arc<Connection>,
    fixed_query: Vec<(String, String)>,
}

impl AssetFileTools {
    #[must_use]
    pub fn new(connection: Arc<Connection>, fixed_query: Vec<(String, String)>) -> Self {
        Self {
            connection,
            fixed_query,
        }
    }

    async fn fetch(&self, tool: &AssetFileTool, job_id: &str) -> Result<CallToolResult, ToolError> {
        let upstream = self.connection.upstream()?;
        let job = encode_component(job_id);

        let listing = self
            .connection
            .send(
                UpstreamRequest::get(format!("/rest/v1/jobs/{job}/assets"))
                    .with_query(&self.fixed_query),
            )
            .await?;
        let hint = NotFoundHint {
            possible_reasons: TEST_ASSETS_REASONS.iter().map(ToString::to_string).collect(),
            suggestions: TEST_ASSETS_SUGGESTIONS.iter().map(ToString::to_string).collect(),
        };
        let listing = relay::body_value(&relay::check_status(listing, Some(&hint))?);
        let file = asset_file_name(&listing, tool.asset_key, job_id)?;

        let download = self
            .connection
            .send(
                UpstreamRequest::get(format!(
                    "/rest/v1/{}/jobs/{job}/assets/{}",
                    encode_component(&upstream.credentials.username),
                    encode_component(file)
                ))
                .with_query(&self.fixed_query),
            )
            .await?;
        let download = relay::check_status(download, None)?;

        Ok(match tool.payload {
            Payload::Json => success(&relay::body_value(&download)),
            Payload::Text => CallToolResult::success(vec![Content::text(relay::body_text(&download))]),
        })
    }
}

fn find(name: &str) -> Option<&'static AssetFileTool> {
    ASSET_FILE_TOOLS.iter().find(|t| t.name == name)
}

fn input_schema() -> Arc<Map<String, Value>> {
    let schema = json!({
        "type": "object",
        "properties": {
            "job_id": {
                "type": "string",
                "description": "The Sauce Labs job ID (VDC jobs only)."
            }
        },
        "required": ["job_id"]
    });
    Arc::new(schema.as_object().cloned().unwrap_or_default())
}

fn job_id_argument(arguments: &Value) -> Result<&str, ToolError> {
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => {
            return Err(ToolError::InvalidArgument(
                "missing required argument: job_id".to_string(),
            ));
        }
        other => {
            return Err(ToolError::InvalidArgument(format!(
                "arguments must be an object, got {other}"
            )));
        }
    };

    let unknown: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|k| *k != "job_id")
        .collect();
    if !unknown.is_empty() {
        return Err(ToolError::InvalidArgument(format!(
            "unknown arguments: {} (accepted: job_id)",
            unknown.join(", ")
        )));
    }

    match args.get("job_id") {
        Some(Value::String(s)) if !matches!(s.trim(), "" | "." | "..") => Ok(s),
        Some(Value::String(s)) => Err(ToolError::InvalidArgument(format!(
            "job_id must not be empty, '.' or '..', got {s:?}"
        ))),
        Some(Value::Null) | None => Err(ToolError::InvalidArgument(
            "missing required argument: job_id".to_string(),
        )),
        Some(other) => Err(ToolError::InvalidArgument(format!(
            "job_id must be a string, got {other}"
        ))),
    }
}

fn asset_file_name<'a>(listing: &'a Value, key: &str, job_id: &str) -> Result<&'a str, ToolError> {
    let Some(entries) = listing.as_object() else {
        return Err(ToolError::Upstream {
            status: None,
            message: format!("asset listing for job {job_id} is not an object"),
            body: Some(listing.clone()),
        });
    };

    match entries.get(key) {
        Some(Value::String(file)) if !matches!(file.as_str(), "" | "." | "..") => Ok(file),
        Some(other) => Err(ToolError::Upstream {
            status: None,
            message: format!("asset '{key}' of job {job_id} is not a file name"),
            body: Some(other.clone()),
        }),
        None => {
            let mut available: Vec<&String> = entries.keys().collect();
            available.sort();
            Err(ToolError::NotFound {
                status: None,
                body: json!({
                    "message": format!("Asset '{key}' not found in job {job_id}"),
                    "available_assets": available,
                }),
                hint: None,
            })
        }
    }
}

#[async_trait]
impl ToolProvider for AssetFileTools {
    fn name(&self) -> &str {
        "job-assets"
    }

    fn list_tools(&self) -> Vec<Tool> {
        let schema = input_schema();
        ASSET_FILE_TOOLS
            .iter()
            .map(|t| {
                let mut tool = Tool::new(t.name, t.description, Arc::clone(&schema));
                tool.annotations = Some(annotations_for(&Method::GET, t.name));
                tool
            })
            .collect()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        let tool = find(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let job_id = job_id_argument(&arguments)?;
        tracing::debug!(tool = %name, asset = tool.asset_key, "resolving job asset");
        self.fetch(tool, job_id).await
    }
}
