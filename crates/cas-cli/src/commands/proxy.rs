//! Proxy ticket requests.

use cas_protocol::{params, CasClient, Parameters};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::output::{output_single, success};

#[derive(Serialize)]
struct ProxyTicket<'a> {
    target_service: &'a str,
    proxy_ticket: &'a str,
}

/// Requests a proxy ticket for `target_service`.
pub async fn run_proxy_ticket<T: CasClient>(
    client: &T,
    pgt: &str,
    target_service: &str,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let mut parameters = Parameters::new();
    parameters.insert(params::TARGET_SERVICE.to_string(), target_service.to_string());

    let ticket = client.request_proxy_ticket(&parameters, Some(pgt)).await?;

    match format {
        OutputFormat::Table => success(&format!("Proxy ticket for {target_service}: {ticket}")),
        _ => output_single(
            &ProxyTicket {
                target_service,
                proxy_ticket: &ticket,
            },
            &ticket,
            format,
        )?,
    }
    Ok(())
}
