//! CAS 1.0 plain-text response parsing.
//!
//! The `validate` endpoint answers `yes\n<user>\n` or `no\n\n`.

use crate::error::{CasError, CasResult};
use crate::types::{error_codes, ValidationResult};

/// Parses a `validate` body.
pub fn parse_validation(body: &str) -> CasResult<ValidationResult> {
    let mut lines = body.lines().map(str::trim);
    match lines.next() {
        Some("yes") => lines
            .next()
            .filter(|user| !user.is_empty())
            .map(ValidationResult::new)
            .ok_or_else(|| CasError::MalformedResponse("'yes' answer without user".into())),
        Some("no") => Err(CasError::authentication_failed(
            error_codes::INVALID_TICKET,
            "ticket rejected by CAS server",
        )),
        _ => Err(CasError::MalformedResponse(
            "expected 'yes' or 'no' on the first line".into(),
        )),
    }
}
