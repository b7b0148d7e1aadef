//! Response body parsers.
//!
//! - [`xml`] - CAS 2.0/3.0 XML answers
//! - [`json`] - CAS 3.0 JSON answers
//! - [`text`] - CAS 1.0 `yes`/`no` answers
//! - [`logout`] - single sign-out notifications

pub mod json;
pub mod logout;
pub mod text;
pub mod xml;

pub use logout::{parse_logout_request, LogoutRequest};

use crate::error::CasResult;
use crate::types::{ResponseFormat, ValidationResult};

/// Parses a validation body in the given format.
pub fn parse_validation(body: &str, format: ResponseFormat) -> CasResult<ValidationResult> {
    match format {
        ResponseFormat::Xml => xml::parse_validation(body),
        ResponseFormat::Json => json::parse_validation(body),
        ResponseFormat::Text => text::parse_validation(body),
    }
}

/// Parses a proxy ticket body in the given format.
///
/// CAS 1.0 has no proxy endpoint, so a text body is read as XML.
pub fn parse_proxy(body: &str, format: ResponseFormat) -> CasResult<String> {
    match format {
        ResponseFormat::Json => json::parse_proxy(body),
        ResponseFormat::Xml | ResponseFormat::Text => xml::parse_proxy(body),
    }
}
