//! JSON response parsing (CAS 3.0 `format=JSON`).

use serde_json::{Map, Value};

use crate::error::{CasError, CasResult};
use crate::types::{error_codes, ValidationResult};

fn outcome(body: &str) -> CasResult<(String, Map<String, Value>)> {
    let document: Value = serde_json::from_str(body)?;
    let response = document
        .get("serviceResponse")
        .and_then(Value::as_object)
        .ok_or_else(|| CasError::MalformedResponse("missing serviceResponse".into()))?;

    let (name, value) = response
        .iter()
        .next()
        .ok_or_else(|| CasError::MalformedResponse("empty serviceResponse".into()))?;
    let object = value
        .as_object()
        .cloned()
        .ok_or_else(|| CasError::MalformedResponse(format!("{name} is not an object")))?;
    Ok((name.clone(), object))
}

fn failure(object: &Map<String, Value>) -> (String, String) {
    let code = object
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or(error_codes::INTERNAL_ERROR)
        .to_string();
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    (code, description)
}

/// Flattens a JSON value into the strings it carries.
fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Bool(_) | Value::Number(_) => vec![value.to_string()],
        Value::Array(items) => items.iter().flat_map(strings).collect(),
        Value::Object(map) => map.values().flat_map(strings).collect(),
    }
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parses a `serviceValidate` / `proxyValidate` JSON body.
pub fn parse_validation(body: &str) -> CasResult<ValidationResult> {
    let (name, object) = outcome(body)?;
    match name.as_str() {
        "authenticationSuccess" => {
            let user = non_empty_str(&object, "user").ok_or_else(|| {
                CasError::MalformedResponse("authenticationSuccess without user".into())
            })?;
            let mut result = ValidationResult::new(user);

            for (key, value) in &object {
                match key.as_str() {
                    "user" => {}
                    "proxyGrantingTicket" => {
                        result.proxy_granting_ticket_iou =
                            non_empty_str(&object, key).map(str::to_string);
                    }
                    "proxies" => result.proxies = strings(value),
                    "attributes" => {
                        if let Value::Object(attributes) = value {
                            for (attribute, values) in attributes {
                                result.add_attribute_values(attribute, strings(values));
                            }
                        }
                    }
                    _ => result.add_attribute_values(key, strings(value)),
                }
            }
            Ok(result)
        }
        "authenticationFailure" => {
            let (code, description) = failure(&object);
            Err(CasError::AuthenticationFailed { code, description })
        }
        other => Err(CasError::MalformedResponse(format!(
            "unexpected validation outcome {other}"
        ))),
    }
}

/// Parses a `proxy` JSON body into the issued proxy ticket.
pub fn parse_proxy(body: &str) -> CasResult<String> {
    let (name, object) = outcome(body)?;
    match name.as_str() {
        "proxySuccess" => non_empty_str(&object, "proxyTicket")
            .map(str::to_string)
            .ok_or_else(|| CasError::MalformedResponse("proxySuccess without proxyTicket".into())),
        "proxyFailure" => {
            let (code, description) = failure(&object);
            Err(CasError::Proxy(format!("{code}: {description}")))
        }
        other => Err(CasError::MalformedResponse(format!(
            "unexpected proxy outcome {other}"
        ))),
    }
}
