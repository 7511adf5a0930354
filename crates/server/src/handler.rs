//! MCP protocol surface: `tools/*` over the registry, plus the `sauce://account` resource.

use crate::registry::ToolRegistry;
use rmcp::model::{
    AnnotateAble as _, CallToolRequestParams, CallToolResult, Implementation, ListResourcesResult,
    ListToolsResult, PaginatedRequestParams, ProtocolVersion, RawResource, ReadResourceRequestParams,
    ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt as _};
use sauce_mcp_http_tools::ToolError;
use serde_json::Value;
use std::sync::Arc;

pub const ACCOUNT_RESOURCE_URI: &str = "sauce://account";
const ACCOUNT_TOOL: &str = "get_account_info";

/// How the server introduces itself during `initialize`.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    pub name: &'static str,
    pub title: &'static str,
    pub instructions: &'static str,
    /// Expose `sauce://account` (requires the `get_account_info` tool).
    pub account_resource: bool,
}

#[derive(Clone)]
pub struct SauceMcpHandler {
    inner: Arc<HandlerInner>,
}

struct HandlerInner {
    registry: ToolRegistry,
    identity: ServerIdentity,
}

impl SauceMcpHandler {
    #[must_use]
    pub fn new(registry: ToolRegistry, identity: ServerIdentity) -> Self {
        Self {
            inner: Arc::new(HandlerInner { registry, identity }),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.inner.registry
    }

    fn account_resource_enabled(&self) -> bool {
        self.inner.identity.account_resource && self.inner.registry.contains(ACCOUNT_TOOL)
    }

    async fn read_account(&self) -> Result<String, ErrorData> {
        let result = self
            .inner
            .registry
            .call(ACCOUNT_TOOL, Value::Null)
            .await
            .map_err(|e| match e {
                ToolError::NotFound { .. } | ToolError::UnknownTool(_) => {
                    ErrorData::resource_not_found(e.to_string(), Some(e.to_json()))
                }
                other => ErrorData::internal_error(other.to_string(), Some(other.to_json())),
            })?;

        Ok(result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default())
    }
}

impl ServerHandler for SauceMcpHandler {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.inner.registry.list_tools(),
            ..Default::default()
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let arguments = request.arguments.map_or(Value::Null, Value::Object);
            match self.inner.registry.call(&request.name, arguments).await {
                Ok(result) => Ok(result),
                Err(ToolError::UnknownTool(name)) => Err(ErrorData::invalid_params(
                    format!("unknown tool: {name}"),
                    None,
                )),
                Err(e) => Ok(e.into_call_result()),
            }
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, ErrorData>> + Send + '_ {
        let mut resources = Vec::new();
        if self.account_resource_enabled() {
            let mut account = RawResource::new(ACCOUNT_RESOURCE_URI, "account");
            account.description = Some("Sauce Labs account information for the configured user".to_string());
            account.mime_type = Some("application/json".to_string());
            resources.push(account.no_annotation());
        }
        std::future::ready(Ok(ListResourcesResult {
            resources,
            ..Default::default()
        }))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, ErrorData>> + Send + '_ {
        async move {
            if request.uri != ACCOUNT_RESOURCE_URI || !self.account_resource_enabled() {
                return Err(ErrorData::resource_not_found(
                    format!("unknown resource: {}", request.uri),
                    None,
                ));
            }
            let text = self.read_account().await?;
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, request.uri)],
            })
        }
    }

    fn get_info(&self) -> ServerInfo {
        let identity = &self.inner.identity;
        let capabilities = if identity.account_resource {
            ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build()
        } else {
            ServerCapabilities::builder().enable_tools().build()
        };
        ServerInfo {
            capabilities,
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: identity.name.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some(identity.title.to_string()),
                ..Default::default()
            },
            instructions: Some(identity.instructions.to_string()),
        }
    }
}

/// Serve MCP over stdin/stdout until the client disconnects.
///
/// # Errors
///
/// Returns an error if the transport fails to start or the service task fails.
pub async fn serve_stdio(handler: SauceMcpHandler) -> anyhow::Result<()> {
    tracing::info!(tools = handler.registry().len(), "serving MCP over stdio");
    let service = handler
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| anyhow::anyhow!("failed to start MCP transport: {e}"))?;
    let reason = service.waiting().await?;
    tracing::info!(?reason, "MCP session ended");
    Ok(())
}
