#![allow(dead_code)]

use rmcp::model::CallToolResult;
use sauce_mcp_env::SauceConfig;
use sauce_mcp_http_tools::connection::Connection;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub use sauce_mcp_test_support::{KillOnDrop, MockUpstream};

pub fn sauce_config(base_url: &str) -> SauceConfig {
    SauceConfig {
        username: Some("u1".to_string()),
        access_key: Some("k1".to_string()),
        region: None,
        api_url: Some(base_url.to_string()),
    }
}

pub fn connection_with_timeout(config: &SauceConfig, timeout: Duration) -> Arc<Connection> {
    Arc::new(Connection::new(config, timeout).expect("connection"))
}

pub fn connection(base_url: &str) -> Arc<Connection> {
    connection_with_timeout(&sauce_config(base_url), Duration::from_secs(5))
}

pub fn text_of(result: &CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

pub fn json_of(result: &CallToolResult) -> Value {
    serde_json::from_str(&text_of(result)).expect("tool result is JSON")
}
