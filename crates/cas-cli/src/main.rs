//! # CAS CLI
//!
//! Command-line tool for working with a CAS server.

#![forbid(unsafe_code)]

use std::sync::Arc;

use cas_cache::MemoryCacheProvider;
use cas_cli::{
    cli::{Cli, Command},
    commands::{run, run_config, CLI_REQUEST_URI},
    config::CliConfig,
    output::error,
    CliResult,
};
use cas_protocol::{Cas, Ecas, ReqwestHttpClient, ServerRequest};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = match CliConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    if let Err(e) = execute(cli, &mut config).await {
        error(&e.to_string());
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, config: &mut CliConfig) -> CliResult<()> {
    let format = cli.output.unwrap_or(config.output_format);

    if let Command::Config(cmd) = cli.command {
        return run_config(cmd, config, cli.config.as_deref(), cli.server.as_deref(), format);
    }

    let properties = config.effective_properties(cli.server.as_deref())?;
    let http = ReqwestHttpClient::new(properties.http_timeout())?;
    let cache = Arc::new(MemoryCacheProvider::new());
    let request = ServerRequest::get(CLI_REQUEST_URI)?;

    if cli.ecas || config.ecas {
        tracing::debug!(server = %properties.base_url(), "Using the ECAS client");
        run(cli.command, Ecas::new(&properties, request, http, cache), format).await
    } else {
        tracing::debug!(server = %properties.base_url(), "Using the CAS client");
        run(cli.command, Cas::new(properties, request, http, cache), format).await
    }
}
