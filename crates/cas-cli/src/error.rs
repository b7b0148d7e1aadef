//! CLI error types.

use thiserror::Error;

use cas_protocol::CasError;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// CAS protocol error.
    #[error(transparent)]
    Cas(#[from] CasError),

    /// The CAS client gave no answer where one was expected.
    #[error("no response: {0}")]
    NoResponse(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
