use anyhow::Context as _;
use clap::Parser;
use sauce_mcp::cli::CommonArgs;
use sauce_mcp::{general_handler, general_registry, handler, logging};
use sauce_mcp_http_tools::connection::Connection;
use std::sync::Arc;

/// MCP server exposing the Sauce Labs REST API as tools over stdio.
#[derive(Debug, Parser)]
#[command(name = "sauce-api-mcp", version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.common.ensure_not_interactive() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    logging::init(&cli.common.log_level, cli.common.log_format)?;

    let connection = Arc::new(
        Connection::new(&cli.common.sauce_config(), cli.common.timeout())
            .context("failed to set up the HTTP client")?,
    );
    logging::log_upstream(&connection);

    let registry = general_registry(connection).context("failed to register tools")?;
    tracing::info!(tools = registry.len(), "registered Sauce Labs tools");

    handler::serve_stdio(general_handler(registry)).await
}
