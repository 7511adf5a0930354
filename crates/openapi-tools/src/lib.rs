//! OpenAPI -> MCP tool synthesis for the Sauce Labs Real Device Cloud server.
//!
//! The RDC schema is fetched once at start, turned into [`sauce_mcp_http_tools::config::ToolSpec`]s
//! by [`discovery::synthesize`] and served through the same HTTP tool runtime as the static
//! catalog. Any failure leaves the source empty instead of stopping the process.

pub mod config;
pub mod discovery;
pub mod error;
pub mod resolver;
pub mod runtime;
