use anyhow::Context as _;
use clap::Parser;
use sauce_mcp::cli::CommonArgs;
use sauce_mcp::{handler, logging, rdc_handler, rdc_registry};
use sauce_mcp_http_tools::connection::Connection;
use std::sync::Arc;

/// MCP server exposing the Sauce Labs Real Device Cloud API, generated from its OpenAPI document.
#[derive(Debug, Parser)]
#[command(name = "sauce-rdc-mcp", version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// OpenAPI document location (URL or file). Defaults to `/rdc/v2/openapi.yaml` on the API host.
    #[arg(long, env = "SAUCE_RDC_OPENAPI_SPEC")]
    rdc_spec: Option<String>,
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

    let registry = rdc_registry(connection, cli.rdc_spec)
        .await
        .context("failed to register tools")?;
    if registry.is_empty() {
        tracing::warn!("no RDC tools available; tools/list will be empty");
    }

    handler::serve_stdio(rdc_handler(registry)).await
}
