//! AppHub CLI - install and run containerized apps

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use apphub_cli::cli::Cli;
use apphub_cli::commands::error_code;
use apphub_cli::output::OutputContext;
use apphub_cli::output::json::format_error;

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "APPHUB_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("apphub=warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let no_color = cli.no_color;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let message = format!("{e:#}");
            match format_error(&message, error_code(&e)) {
                Ok(body) if json => eprintln!("{body}"),
                _ => OutputContext::new(no_color, false).error(&format!("Error: {message}")),
            }
            ExitCode::FAILURE
        }
    }
}
