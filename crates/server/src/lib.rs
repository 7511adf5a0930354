//! Sauce Labs MCP servers.
//!
//! Two binaries share this library: `sauce-api-mcp` serves the hand-declared catalog, and
//! `sauce-rdc-mcp` serves tools synthesized from the Real Device Cloud OpenAPI document.

pub mod assets;
pub mod catalog;
pub mod cli;
pub mod handler;
pub mod logging;
pub mod registry;

use crate::assets::AssetFileTools;
use crate::handler::{SauceMcpHandler, ServerIdentity};
use crate::registry::{ToolProvider, ToolRegistry};
use sauce_mcp_http_tools::ToolError;
use sauce_mcp_http_tools::connection::Connection;
use sauce_mcp_http_tools::runtime::HttpToolSource;
use sauce_mcp_openapi_tools::config::OpenApiSourceConfig;
use sauce_mcp_openapi_tools::runtime::OpenApiToolSource;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Value of the `ai` query parameter sent with every RDC-server request.
pub const RDC_AI_TAG: &str = "rdc_mcp";

pub const GENERAL_IDENTITY: ServerIdentity = ServerIdentity {
    name: "sauce-api-mcp",
    title: "Sauce Labs API",
    instructions: "Read-only access to Sauce Labs: account, teams, users, jobs and their assets, \
                   builds, Sauce Connect tunnels, app storage and real devices. Use \
                   get_job_details first to tell Virtual Device Cloud jobs from Real Device \
                   Cloud jobs before fetching assets.",
    account_resource: true,
};

pub const RDC_IDENTITY: ServerIdentity = ServerIdentity {
    name: "sauce-rdc-mcp",
    title: "Sauce Labs Real Device Cloud",
    instructions: "Tools generated from the Sauce Labs Real Device Cloud OpenAPI document. \
                   Each tool maps to one API operation.",
    account_resource: false,
};

/// Registry for the general server: the catalog plus the job asset file tools.
///
/// # Errors
///
/// Returns `Config` if the catalog is invalid or two tools share a name.
pub fn general_registry(connection: Arc<Connection>) -> Result<ToolRegistry, ToolError> {
    let catalog = HttpToolSource::new("sauce-api", catalog::general_tools(), Arc::clone(&connection))?;
    let assets = AssetFileTools::new(connection, catalog.fixed_query().to_vec());
    let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(catalog), Arc::new(assets)];
    ToolRegistry::new(providers)
}

/// Registry for the RDC server. A schema that fails to load leaves the registry empty.
///
/// # Errors
///
/// Returns `Config` if two synthesized tools share a name.
pub async fn rdc_registry(
    connection: Arc<Connection>,
    spec: Option<String>,
) -> Result<ToolRegistry, ToolError> {
    let config = OpenApiSourceConfig {
        spec,
        fixed_query: BTreeMap::from([("ai".to_string(), RDC_AI_TAG.to_string())]),
        ..OpenApiSourceConfig::default()
    };
    let source = OpenApiToolSource::build("sauce-rdc", config, connection).await;
    let providers: Vec<Arc<dyn ToolProvider>> = vec![Arc::new(source)];
    ToolRegistry::new(providers)
}

#[must_use]
pub fn general_handler(registry: ToolRegistry) -> SauceMcpHandler {
    SauceMcpHandler::new(registry, GENERAL_IDENTITY)
}

#[must_use]
pub fn rdc_handler(registry: ToolRegistry) -> SauceMcpHandler {
    SauceMcpHandler::new(registry, RDC_IDENTITY)
}
