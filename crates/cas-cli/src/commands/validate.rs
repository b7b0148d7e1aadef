//! Ticket validation.

use std::net::SocketAddr;

use axum::Router;
use cas_protocol::endpoints::{cas_router, CasState};
use cas_protocol::{params, CasClient, Parameters, ValidationResult};
use tokio::net::TcpListener;

use crate::cli::ValidateArgs;
use crate::config::OutputFormat;
use crate::output::{info, output, output_single, success, AttributeRow};

/// Validates a ticket and prints the authenticated user.
///
/// With `--callback-bind` the proxy callback is served while the validation
/// runs, so the CAS server can deliver the proxy-granting ticket.
pub async fn run_validate<T>(client: T, args: ValidateArgs, format: OutputFormat) -> crate::CliResult<()>
where
    T: CasClient + Clone + 'static,
{
    let callback = match args.callback_bind {
        Some(bind) => Some(spawn_callback(client.clone(), bind).await?),
        None => None,
    };

    let parameters = validation_parameters(&args);
    let outcome = if args.proxy {
        client.request_proxy_validate(&parameters).await.map(Some)
    } else {
        client.request_ticket_validation(&parameters).await
    };

    if let Some(callback) = callback {
        callback.abort();
    }

    let result = outcome?.ok_or_else(|| crate::CliError::NoResponse("no ticket to validate".to_string()))?;
    print_result(&result, format)
}

pub(crate) fn validation_parameters(args: &ValidateArgs) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert(params::TICKET.to_string(), args.ticket.clone());
    parameters.insert(params::SERVICE.to_string(), args.service.clone());
    if let Some(pgt_url) = &args.pgt_url {
        parameters.insert(params::PGT_URL.to_string(), pgt_url.clone());
    }
    if let Some(format) = &args.format {
        parameters.insert(params::FORMAT.to_string(), format.to_uppercase());
    }
    parameters
}

async fn spawn_callback<T>(client: T, bind: SocketAddr) -> crate::CliResult<tokio::task::JoinHandle<()>>
where
    T: CasClient + Clone + 'static,
{
    let callback_path = client.properties().callback_path().to_string();
    let app: Router = cas_router(&callback_path, "/cas/logout").with_state(CasState::new(client));

    let listener = TcpListener::bind(bind).await?;
    info(&format!("Proxy callback listening on {}{callback_path}", listener.local_addr()?));

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Proxy callback server failed");
        }
    }))
}

fn print_result(result: &ValidationResult, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            success(&format!("Ticket valid for {}", result.user));
            output(&AttributeRow::from_result(result), format)
        }
        _ => output_single(result, &result.user, format),
    }
}
