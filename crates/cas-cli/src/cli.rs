//! CLI argument parsing.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{OutputFormat, VersionArg};

/// CAS CLI - Work with a Central Authentication Service server.
#[derive(Debug, Parser)]
#[command(name = "cas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// CAS server base URL (overrides config).
    #[arg(short, long, env = "CAS_SERVER_URL")]
    pub server: Option<String>,

    /// Configuration file (defaults to ~/.cas/cas.toml).
    #[arg(short, long, env = "CAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use the ECAS profile (XML answers, `userDetails`).
    #[arg(long, env = "CAS_ECAS")]
    pub ecas: bool,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the login URL for a service.
    LoginUrl(LoginArgs),

    /// Print the logout URL.
    LogoutUrl {
        /// Where CAS should send the browser after logout.
        #[arg(long)]
        service: Option<String>,
    },

    /// Validate a service or proxy ticket.
    Validate(ValidateArgs),

    /// Request a proxy ticket with a proxy-granting ticket.
    ProxyTicket {
        /// The proxy-granting ticket.
        #[arg(long, env = "CAS_PGT")]
        pgt: String,

        /// The service the proxy ticket is for.
        #[arg(long)]
        target_service: String,
    },

    /// Serve the proxy callback and single sign-out endpoints.
    ServeCallback {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8443")]
        bind: SocketAddr,

        /// Path of the single sign-out endpoint.
        #[arg(long, default_value = "/cas/logout")]
        logout_path: String,
    },

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments of `login-url`.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// The service URL CAS redirects back to.
    #[arg(long)]
    pub service: String,

    /// Force the user to enter credentials again.
    #[arg(long)]
    pub renew: bool,

    /// Do not ask for credentials; come back without a ticket if not logged in.
    #[arg(long)]
    pub gateway: bool,
}

/// Arguments of `validate`.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// The ticket to validate.
    pub ticket: String,

    /// The service URL the ticket was issued for.
    #[arg(long)]
    pub service: String,

    /// Proxy callback URL to request a proxy-granting ticket.
    #[arg(long)]
    pub pgt_url: Option<String>,

    /// Response format to request (XML or JSON).
    #[arg(long)]
    pub format: Option<String>,

    /// Force validation on proxyValidate.
    #[arg(long)]
    pub proxy: bool,

    /// Serve the proxy callback on this address while validating.
    #[arg(long, requires = "pgt_url")]
    pub callback_bind: Option<SocketAddr>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the current configuration.
    Show,

    /// Validate the configuration and list the resolved endpoints.
    Check,

    /// Write a configuration with the standard endpoints of a server.
    Init {
        /// CAS server base URL.
        #[arg(long)]
        server: String,

        /// CAS protocol version.
        #[arg(long, value_enum, default_value = "3.0")]
        protocol: VersionArg,

        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },
}
