//! Declarative HTTP tools for the Sauce Labs MCP servers.
//!
//! A tool is a [`config::ToolSpec`]: one upstream method and path plus the parameters that feed
//! it. [`runtime::HttpToolSource`] validates the arguments of a call, maps them onto exactly one
//! request over a shared [`connection::Connection`] and relays the response.
//!
//! Both the static catalogs and the OpenAPI-derived RDC tools go through this crate.

pub mod config;
pub mod connection;
pub mod error;
pub mod relay;
pub mod response_shaping;
pub mod runtime;
pub mod semantics;

pub use error::{Result, ToolError};
