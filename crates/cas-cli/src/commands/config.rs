//! Configuration management commands.

use std::path::Path;

use cas_protocol::{Endpoint, Properties, ProtocolVersion};

use crate::cli::ConfigCommand;
use crate::config::{OutputFormat, VersionArg};
use crate::output::{info, output, success, warning, EndpointRow};
use crate::CliConfig;

/// Runs a config command.
pub fn run_config(
    cmd: ConfigCommand,
    config: &mut CliConfig,
    path: Option<&Path>,
    server: Option<&str>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config, path),
        ConfigCommand::Check => check_config(config, server, format),
        ConfigCommand::Init {
            server,
            protocol,
            force,
        } => init_config(config, path, &server, protocol, force),
    }
}

/// Shows the current configuration.
fn show_config(config: &CliConfig, path: Option<&Path>) -> crate::CliResult<()> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => CliConfig::config_path()?,
    };

    info(&format!("Configuration file: {}", config_path.display()));
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Validates the configuration and lists the resolved endpoints.
fn check_config(config: &CliConfig, server: Option<&str>, format: OutputFormat) -> crate::CliResult<()> {
    let properties = config.effective_properties(server)?;

    if format == OutputFormat::Table {
        success(&format!(
            "CAS {} configuration for {} is valid",
            properties.protocol_version(),
            properties.base_url()
        ));
    }
    if properties.endpoint(Endpoint::Proxy).is_none() {
        warning("No proxy endpoint configured; proxy tickets are unavailable");
    }
    output(&EndpointRow::from_properties(&properties), format)
}

/// Writes a configuration with the standard endpoints of a server.
fn init_config(
    config: &mut CliConfig,
    path: Option<&Path>,
    server: &str,
    protocol: VersionArg,
    force: bool,
) -> crate::CliResult<()> {
    if config.cas.is_some() && !force {
        return Err(crate::CliError::InvalidArgument(
            "a CAS server is already configured; use --force to replace it".to_string(),
        ));
    }

    config.cas = Some(Properties::for_server(server, ProtocolVersion::from(protocol))?);
    let saved = config.save(path)?;
    success(&format!("Configuration written to {}", saved.display()));
    Ok(())
}
