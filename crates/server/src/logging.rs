//! Log setup. Output goes to stderr; stdout carries the MCP protocol.

use crate::cli::LogFormat;
use sauce_mcp_http_tools::connection::Connection;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter does not parse or a subscriber is already installed.
pub fn init(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{level}': {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

/// Log where calls will go, or why they will fail. Never logs credentials.
pub fn log_upstream(connection: &Connection) {
    match connection.upstream() {
        Ok(upstream) => tracing::info!(
            region = upstream.region.map_or("custom", |r| r.code()),
            host = upstream.base_url.host_str().unwrap_or_default(),
            timeout_secs = connection.timeout().as_secs(),
            "Sauce Labs upstream resolved"
        ),
        Err(e) => tracing::warn!(
            error = %e,
            "Sauce Labs configuration incomplete; every tool call will fail until it is fixed"
        ),
    }
}
