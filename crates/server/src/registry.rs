//! Process-wide tool registry.
//!
//! Built once from the tool providers before the transport starts; immutable afterwards.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use sauce_mcp_http_tools::ToolError;
use sauce_mcp_http_tools::runtime::HttpToolSource;
use sauce_mcp_openapi_tools::runtime::OpenApiToolSource;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// A group of tools that share an execution path.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn name(&self) -> &str;

    fn list_tools(&self) -> Vec<Tool>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError>;
}

#[async_trait]
impl ToolProvider for HttpToolSource {
    fn name(&self) -> &str {
        HttpToolSource::name(self)
    }

    fn list_tools(&self) -> Vec<Tool> {
        HttpToolSource::list_tools(self)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        HttpToolSource::call_tool(self, name, arguments).await
    }
}

#[async_trait]
impl ToolProvider for OpenApiToolSource {
    fn name(&self) -> &str {
        OpenApiToolSource::name(self)
    }

    fn list_tools(&self) -> Vec<Tool> {
        OpenApiToolSource::list_tools(self)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        OpenApiToolSource::call_tool(self, name, arguments).await
    }
}

pub struct ToolRegistry {
    tools: Vec<Tool>,
    owners: HashMap<String, Arc<dyn ToolProvider>>,
}

impl ToolRegistry {
    /// Register every tool of every provider, in provider order.
    ///
    /// # Errors
    ///
    /// Returns `Config` when two tools share a name.
    pub fn new(providers: Vec<Arc<dyn ToolProvider>>) -> Result<Self, ToolError> {
        let mut tools = Vec::new();
        let mut owners: HashMap<String, Arc<dyn ToolProvider>> = HashMap::new();

        for provider in providers {
            for tool in provider.list_tools() {
                let name = tool.name.to_string();
                if let Some(existing) = owners.get(&name) {
                    return Err(ToolError::Config(format!(
                        "duplicate tool name '{name}' (provided by '{}' and '{}')",
                        existing.name(),
                        provider.name()
                    )));
                }
                owners.insert(name, Arc::clone(&provider));
                tools.push(tool);
            }
        }

        Ok(Self { tools, owners })
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Dispatch one call to the provider that owns `name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` for unregistered names, otherwise the provider's error.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        let provider = self
            .owners
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let started = Instant::now();
        let result = provider.call_tool(name, arguments).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(_) => tracing::debug!(tool = %name, provider = %provider.name(), elapsed_ms, "tool call ok"),
            Err(e) => tracing::warn!(
                tool = %name,
                provider = %provider.name(),
                kind = e.kind(),
                status = e.status(),
                elapsed_ms,
                error = %e,
                "tool call failed"
            ),
        }
        result
    }
}
