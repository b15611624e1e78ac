//! Error types for the http module.

use http::StatusCode;
use thiserror::Error;

/// Errors that can occur during HTTP operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(StatusCode),

    #[error("Invalid status code {0} with message: {1}")]
    InvalidStatusCodeWithMessage(StatusCode, String),

    #[error("Header value outside of legal range: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("Response body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Http client error: {0}")]
    Instance(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Result type alias for HTTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Wraps a client-specific error so transports can return it unchanged.
pub fn instance_error<E: std::error::Error + Send + Sync + 'static>(error: E) -> Error {
    Error::Instance(error.into())
}
