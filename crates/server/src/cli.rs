//! Command-line and environment configuration shared by both servers.

use clap::{Args, ValueEnum};
use sauce_mcp_env::SauceConfig;
use std::io::IsTerminal as _;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Sauce Labs username.
    #[arg(long, env = "SAUCE_USERNAME")]
    pub username: Option<String>,

    /// Sauce Labs access key.
    #[arg(long, env = "SAUCE_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Data center region (us-west-1, us-east-4, eu-central-1).
    #[arg(long, env = "SAUCE_REGION")]
    pub region: Option<String>,

    /// Base URL override for enterprise deployments; wins over --region.
    #[arg(long, env = "SAUCE_API_URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(
        long,
        env = "SAUCE_MCP_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Log filter (e.g. `info`, `debug`, `sauce_mcp_http_tools=trace`).
    #[arg(long, env = "SAUCE_MCP_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "SAUCE_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Run even when stdin or stdout is a terminal.
    #[arg(long)]
    pub allow_tty: bool,
}

impl CommonArgs {
    #[must_use]
    pub fn sauce_config(&self) -> SauceConfig {
        SauceConfig {
            username: self.username.clone(),
            access_key: self.access_key.clone(),
            region: self.region.clone(),
            api_url: self.api_url.clone(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Refuse to run interactively: stdio belongs to the MCP client.
    ///
    /// # Errors
    ///
    /// Returns an error when stdin or stdout is a terminal and `--allow-tty` is not set.
    pub fn ensure_not_interactive(&self) -> anyhow::Result<()> {
        if self.allow_tty {
            return Ok(());
        }
        if std::io::stdin().is_terminal() || std::io::stdout().is_terminal() {
            anyhow::bail!(
                "this server is not meant to be run interactively; start it from an MCP client (or pass --allow-tty)"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn flags_build_sauce_config() {
        let cli = TestCli::try_parse_from([
            "test",
            "--username",
            "u1",
            "--access-key",
            "k1",
            "--region",
            "eu-central",
            "--timeout-secs",
            "5",
            "--log-format",
            "json",
        ])
        .expect("parse");

        let cfg = cli.common.sauce_config();
        assert_eq!(cfg.username.as_deref(), Some("u1"));
        assert_eq!(cfg.region.as_deref(), Some("eu-central"));
        assert_eq!(cli.common.timeout(), Duration::from_secs(5));
        assert_eq!(cli.common.log_format, LogFormat::Json);
    }

    #[test]
    fn zero_timeout_is_a_parse_error() {
        assert!(TestCli::try_parse_from(["test", "--timeout-secs", "0"]).is_err());
    }

    #[test]
    fn allow_tty_skips_the_guard() {
        let cli = TestCli::try_parse_from(["test", "--allow-tty"]).expect("parse");
        assert!(cli.common.ensure_not_interactive().is_ok());
    }
}
