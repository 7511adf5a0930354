//! Hand-declared tool catalog for the general-purpose server.
//!
//! Every tool is data: a [`ToolSpec`] mapped onto one Sauce Labs REST call. The two-step asset
//! file tools live in [`crate::assets`] because they need an intermediate lookup.

mod accounts;
mod builds;
mod devices;
mod jobs;
mod storage;
mod tunnels;

pub(crate) use jobs::{TEST_ASSETS_REASONS, TEST_ASSETS_SUGGESTIONS};

use sauce_mcp_http_tools::config::{HttpToolsConfig, ToolSpec, UnknownArgPolicy};
use std::collections::BTreeMap;

/// Value of the `ai` query parameter sent with every general-server request.
pub const GENERAL_AI_TAG: &str = "mcp";

#[must_use]
pub fn general_tools() -> HttpToolsConfig {
    let tools: Vec<ToolSpec> = [
        accounts::tools(),
        jobs::tools(),
        builds::tools(),
        tunnels::tools(),
        storage::tools(),
        devices::tools(),
    ]
    .into_iter()
    .flatten()
    .collect();

    HttpToolsConfig {
        fixed_query: BTreeMap::from([("ai".to_string(), GENERAL_AI_TAG.to_string())]),
        unknown_args: UnknownArgPolicy::Reject,
        tools,
    }
}
