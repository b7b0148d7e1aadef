//! Single sign-out request parsing.
//!
//! On logout the CAS server POSTs a SAML `LogoutRequest` to every service
//! that validated a ticket of the ended session, in the `logoutRequest` form
//! field. Its `SessionIndex` is the service ticket that was issued.

use crate::error::{CasError, CasResult};

use super::xml::parse_document;

/// Maximum accepted `SessionIndex` length.
const MAX_SESSION_INDEX_LEN: usize = 256;

/// A parsed single sign-out notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutRequest {
    /// The request ID.
    pub id: Option<String>,
    /// The user the session belonged to.
    pub name_id: Option<String>,
    /// The service ticket of the ended session.
    pub session_index: String,
}

/// Parses a `LogoutRequest` document.
pub fn parse_logout_request(xml: &str) -> CasResult<LogoutRequest> {
    let root = parse_document(xml)?;
    if root.name != "LogoutRequest" {
        return Err(CasError::MalformedResponse(format!(
            "expected LogoutRequest, found {}",
            root.name
        )));
    }

    let session_index = root
        .child_text("SessionIndex")
        .ok_or_else(|| CasError::MalformedResponse("LogoutRequest without SessionIndex".into()))?;
    if session_index.len() > MAX_SESSION_INDEX_LEN {
        return Err(CasError::MalformedResponse("SessionIndex too long".into()));
    }

    Ok(LogoutRequest {
        id: root.attribute("ID").map(str::to_string),
        name_id: root.child_text("NameID").map(str::to_string),
        session_index: session_index.to_string(),
    })
}
