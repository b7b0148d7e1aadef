//! Command implementations.
//!
//! Every protocol command runs against a [`CasClient`], so the same code
//! serves plain CAS and ECAS servers.

pub mod config;
pub mod proxy;
pub mod redirect;
pub mod serve;
pub mod validate;

pub use config::run_config;

use cas_protocol::CasClient;

use crate::cli::Command;
use crate::config::OutputFormat;

/// Inbound request the CLI binds its client to; commands pass the
/// service explicitly.
pub const CLI_REQUEST_URI: &str = "http://localhost/";

/// Runs a protocol command.
///
/// `Command::Config` is handled by [`run_config`] before a client exists and
/// is rejected here.
pub async fn run<T>(command: Command, client: T, format: OutputFormat) -> crate::CliResult<()>
where
    T: CasClient + Clone + 'static,
{
    match command {
        Command::LoginUrl(args) => redirect::run_login_url(&client, &args, format),
        Command::LogoutUrl { service } => redirect::run_logout_url(&client, service, format),
        Command::Validate(args) => validate::run_validate(client, args, format).await,
        Command::ProxyTicket { pgt, target_service } => {
            proxy::run_proxy_ticket(&client, &pgt, &target_service, format).await
        }
        Command::ServeCallback { bind, logout_path } => {
            serve::run_serve_callback(client, bind, &logout_path).await
        }
        Command::Config(_) => Err(crate::CliError::InvalidArgument(
            "config commands do not use a CAS client".to_string(),
        )),
    }
}
