//! Unified error types for shuttle-access.
//!
//! [`Error`] is what every fallible [`Access`](crate::Access) operation
//! returns. Configuration and storage failures have their own enums so callers
//! can match on the precise cause; transport failures keep the
//! [`http::Error`](crate::http::Error) produced by the transport unchanged.

use crate::http;

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for shuttle-access operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or incomplete configuration, reported while building.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// `login` was called without an identity name and a password or token.
    #[error("No credentials specified.")]
    Credentials,

    /// The server answered with a body missing required fields.
    #[error("protocol: {0}")]
    Protocol(String),

    /// The server rejected an explicit password login.
    #[error("Invalid login credentials.")]
    Authentication,

    /// Transport failure, passed through from the transport.
    #[error("http: {0}")]
    Http(#[from] http::Error),

    /// The credential store failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// A request body could not be serialized.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a protocol error.
    #[inline]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error for a missing setting.
    #[inline]
    pub fn config_missing(field: impl Into<String>) -> Self {
        Self::Config(ConfigError::missing(field))
    }

    /// Returns `true` when the failure came from the network path.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Result type alias for shuttle-access operations.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading a config file.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON.
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing required setting.
    #[error("missing: {0}")]
    Missing(String),

    /// Invalid value.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a missing setting error.
    #[inline]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Create an invalid value error.
    #[inline]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Storage Errors
// ============================================================================

/// Error type for credential store operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document is not valid JSON.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A lock guarding the store was poisoned.
    #[error("lock error: {0}")]
    Lock(String),

    /// Backend-specific failure.
    #[error("[{backend}] {message}")]
    Backend {
        /// Backend identifier (e.g., `"file"`).
        backend: &'static str,
        /// Human-readable error description.
        message: String,
    },
}

impl StorageError {
    /// Creates a [`Backend`](Self::Backend) error for the given backend.
    #[must_use]
    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }
}

/// Result type for credential store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: Error = ConfigError::missing("base_url").into();
        assert!(matches!(err, Error::Config(ConfigError::Missing(_))));

        let err: Error = StorageError::Lock("poisoned".into()).into();
        assert!(matches!(err, Error::Storage(_)));

        let err: Error = http::Error::InvalidStatusCode(::http::StatusCode::BAD_GATEWAY).into();
        assert!(err.is_transport());
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(Error::Credentials.to_string(), "No credentials specified.");
        assert_eq!(Error::Authentication.to_string(), "Invalid login credentials.");
        assert_eq!(
            Error::config_missing("base_url").to_string(),
            "config: missing: base_url"
        );
    }

    #[test]
    fn test_storage_backend_display() {
        let err = StorageError::backend("file", "read-only filesystem");
        assert_eq!(err.to_string(), "[file] read-only filesystem");
    }
}
