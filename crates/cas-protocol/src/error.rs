//! CAS error types.
//!
//! Provides the error taxonomy for configuration, transport, response parsing,
//! authentication outcomes and proxy ticket handling.

use thiserror::Error;

use cas_cache::CacheError;

/// Result type for CAS operations.
pub type CasResult<T> = Result<T, CasError>;

/// CAS protocol errors.
///
/// The type is `Clone` so that one validation outcome can be handed to every
/// caller waiting on the same ticket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CasError {
    /// Missing or invalid properties.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or IO failure while calling the CAS server.
    #[error("transport error: {0}")]
    Transport(String),

    /// The CAS server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {status} from CAS server")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be parsed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The CAS server explicitly rejected the ticket.
    #[error("authentication failed: {code}: {description}")]
    AuthenticationFailed {
        /// The CAS error code (e.g. `INVALID_TICKET`).
        code: String,
        /// The human-readable description sent by the server.
        description: String,
    },

    /// Missing or expired proxy-granting ticket, or a correlation mismatch.
    #[error("proxy error: {0}")]
    Proxy(String),

    /// A parameter the endpoint requires is absent.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// Cache store failure.
    #[error("cache error: {0}")]
    Cache(String),
}

impl CasError {
    /// Creates an authentication failure.
    #[must_use]
    pub fn authentication_failed(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            code: code.into(),
            description: description.into(),
        }
    }

    /// Returns true if this error is a regular negative outcome rather than a fault.
    ///
    /// A rejected ticket is what happens when a user replays a link or a ticket
    /// expires; it should be answered with a new login, not logged as an error.
    #[must_use]
    pub const fn is_negative_outcome(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Returns the CAS error code if the server sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::AuthenticationFailed { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns the HTTP status an application should answer with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MissingParameter(_) => 400,
            Self::AuthenticationFailed { .. } => 401,
            Self::Proxy(_) => 403,
            Self::Transport(_) | Self::UnexpectedStatus { .. } | Self::MalformedResponse(_) => 502,
            Self::Configuration(_) | Self::Cache(_) => 500,
        }
    }
}

impl From<quick_xml::Error> for CasError {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<serde_json::Error> for CasError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<url::ParseError> for CasError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {err}"))
    }
}

impl From<CacheError> for CasError {
    fn from(err: CacheError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<reqwest::Error> for CasError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
