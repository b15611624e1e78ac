//! Client configuration.
//!
//! [`AccessConfig`] can be built in code, read from a JSON file or taken from
//! the environment. It produces the normalised base URL, the transport and the
//! storage keys used by [`Access`](crate::Access).

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::http::{self, DEFAULT_TIMEOUT_SECS, ReqwestTransport};
use crate::storage::{DEFAULT_IDENTITY_KEY, DEFAULT_TOKEN_KEY, StorageKeys};

/// Environment variable holding the access server URL.
pub const ENV_BASE_URL: &str = "SHUTTLE_ACCESS_URL";

/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "SHUTTLE_ACCESS_TIMEOUT_SECS";

/// Configuration for an access client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Base URL of the access server.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// User agent string.
    pub user_agent: Option<String>,
    /// Storage key for the persisted identity name.
    pub identity_key: String,
    /// Storage key for the persisted session token.
    pub token_key: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl AccessConfig {
    /// Create a configuration for `base_url` with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Build a configuration from [`ENV_BASE_URL`] and [`ENV_TIMEOUT_SECS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unset or the timeout is not a number.
    pub fn from_env() -> ConfigResult<Self> {
        let base_url =
            std::env::var(ENV_BASE_URL).map_err(|_| ConfigError::missing(ENV_BASE_URL))?;
        let mut config = Self::new(base_url);

        if let Ok(timeout) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs = timeout
                .parse()
                .map_err(|_| ConfigError::invalid(format!("{ENV_TIMEOUT_SECS}={timeout}")))?;
            config.timeout_secs = Some(secs);
        }

        Ok(config)
    }

    /// Validate the configuration, returning the normalised base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or unparseable, or a storage
    /// key is empty.
    pub fn validate(&self) -> ConfigResult<Url> {
        if self.identity_key.is_empty() {
            return Err(ConfigError::missing("identity_key"));
        }
        if self.token_key.is_empty() {
            return Err(ConfigError::missing("token_key"));
        }
        normalize_base_url(&self.base_url)
    }

    /// Storage keys described by this configuration.
    #[must_use]
    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            identity: self.identity_key.clone(),
            token: self.token_key.clone(),
        }
    }

    /// Build the HTTP transport described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn transport(&self) -> http::Result<ReqwestTransport> {
        let mut builder = ReqwestTransport::builder();
        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout_secs(timeout);
        }
        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder.build()
    }
}

/// Parse `base_url`, making sure it ends with `/` so endpoint paths join
/// beneath it rather than replacing its last segment.
///
/// # Errors
///
/// Returns an error if the URL is empty, unparseable or cannot carry paths.
pub fn normalize_base_url(base_url: &str) -> ConfigResult<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::missing("base_url"));
    }

    let mut url = Url::parse(trimmed)
        .map_err(|e| ConfigError::invalid(format!("base_url '{trimmed}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::invalid(format!(
            "base_url '{trimmed}' cannot carry endpoint paths"
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let config = AccessConfig::default();
        assert!(config.base_url.is_empty());
        assert_eq!(config.identity_key, "identity-name");
        assert_eq!(config.token_key, "token");
        assert!(config.timeout_secs.is_some());
    }

    #[test]
    fn test_normalize_appends_slash() {
        let url = normalize_base_url("http://access/api").unwrap();
        assert_eq!(url.as_str(), "http://access/api/");
        assert_eq!(
            url.join("sessions").unwrap().as_str(),
            "http://access/api/sessions"
        );

        let url = normalize_base_url("http://access/api/").unwrap();
        assert_eq!(url.as_str(), "http://access/api/");
    }

    #[test]
    fn test_normalize_rejects_bad_urls() {
        assert!(matches!(
            normalize_base_url("   "),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            normalize_base_url("mailto:someone@example.com"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_keys() {
        let mut config = AccessConfig::new("http://access");
        config.token_key.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("access.json");
        file.write_str(r#"{ "base_url": "http://access", "token_key": "session-token" }"#)
            .unwrap();

        let config = AccessConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://access");
        assert_eq!(config.token_key, "session-token");
        assert_eq!(config.identity_key, "identity-name");
        assert_eq!(config.storage_keys().token, "session-token");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("access.json");
        file.write_str("{").unwrap();

        assert!(matches!(
            AccessConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
