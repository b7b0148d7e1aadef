//! Login and logout URLs.

use cas_protocol::{params, CasClient, CasResponse, Parameters};
use serde::Serialize;

use crate::cli::LoginArgs;
use crate::config::OutputFormat;
use crate::output::output_single;

#[derive(Serialize)]
struct Redirect<'a> {
    status: u16,
    location: &'a str,
}

/// Prints the login URL for a service.
pub fn run_login_url<T: CasClient>(client: &T, args: &LoginArgs, format: OutputFormat) -> crate::CliResult<()> {
    let response = client
        .login(&login_parameters(args))
        .ok_or_else(|| crate::CliError::NoResponse("no login redirect could be built".to_string()))?;
    print_redirect(&response, format)
}

/// Prints the logout URL.
pub fn run_logout_url<T: CasClient>(
    client: &T,
    service: Option<String>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let mut parameters = Parameters::new();
    if let Some(service) = service {
        parameters.insert(params::SERVICE.to_string(), service);
    }
    print_redirect(&client.logout(&parameters), format)
}

pub(crate) fn login_parameters(args: &LoginArgs) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert(params::SERVICE.to_string(), args.service.clone());
    if args.renew {
        parameters.insert(params::RENEW.to_string(), "true".to_string());
    }
    if args.gateway {
        parameters.insert(params::GATEWAY.to_string(), "true".to_string());
    }
    parameters
}

fn print_redirect(response: &CasResponse, format: OutputFormat) -> crate::CliResult<()> {
    let location = response
        .location()
        .ok_or_else(|| crate::CliError::NoResponse("redirect without a location".to_string()))?;
    match format {
        OutputFormat::Table => println!("{location}"),
        _ => output_single(
            &Redirect {
                status: response.status,
                location,
            },
            location,
            format,
        )?,
    }
    Ok(())
}
