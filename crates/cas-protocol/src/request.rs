//! Outbound request construction.
//!
//! Every URL the client produces (redirects and server-to-server calls) is
//! built here from the endpoint definition in [`Properties`]:
//!
//! 1. default parameters are merged with the supplied ones, supplied values winning;
//! 2. parameters the endpoint does not allow are dropped, except the protocol ones;
//! 3. boolean flags (`renew`, `gateway`) are sent as `true` or not at all;
//! 4. a missing required parameter fails the build.

use url::Url;

use crate::error::{CasError, CasResult};
use crate::properties::Properties;
use crate::types::{params, Endpoint, Parameters};

/// Builds the parameters that will be sent to an endpoint.
///
/// ## Errors
///
/// Returns `CasError::Configuration` if the endpoint is not configured and
/// `CasError::MissingParameter` if a required parameter is absent or empty.
pub fn build_parameters(
    properties: &Properties,
    endpoint: Endpoint,
    supplied: &Parameters,
) -> CasResult<Parameters> {
    let definition = properties.require_endpoint(endpoint)?;
    let protocol = endpoint.protocol_parameters();

    let mut merged = definition.default_parameters.clone();
    for (name, value) in supplied {
        merged.insert(name.clone(), value.clone());
    }

    let mut out = Parameters::new();
    for (name, value) in merged {
        if !definition.allows(&name) && !protocol.contains(&name.as_str()) {
            tracing::trace!(endpoint = %endpoint, parameter = %name, "Dropping parameter not allowed on endpoint");
            continue;
        }

        if is_flag(&name) {
            if is_truthy(&value) {
                out.insert(name, "true".to_string());
            }
            continue;
        }

        out.insert(name, value);
    }

    for required in endpoint.required_parameters() {
        match out.get(*required) {
            Some(value) if !value.is_empty() => {}
            _ => return Err(CasError::MissingParameter((*required).to_string())),
        }
    }

    Ok(out)
}

/// Builds the absolute URL of an endpoint with its query string.
///
/// ## Errors
///
/// See [`build_parameters`].
pub fn build_url(properties: &Properties, endpoint: Endpoint, supplied: &Parameters) -> CasResult<Url> {
    let parameters = build_parameters(properties, endpoint, supplied)?;
    let mut url = properties.endpoint_url(endpoint)?;
    append_query(&mut url, &parameters);
    Ok(url)
}

/// Appends parameters to a URL's query string.
pub(crate) fn append_query(url: &mut Url, parameters: &Parameters) {
    if parameters.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (name, value) in parameters {
        pairs.append_pair(name, value);
    }
}

fn is_flag(name: &str) -> bool {
    name == params::RENEW || name == params::GATEWAY
}

/// Interprets a flag value the way query strings usually carry booleans.
pub(crate) fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "0" | "no" | "off"
    )
}
