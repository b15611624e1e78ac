//! Wire types exchanged with the access server.

use ::http::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Credentials;
use crate::error::{Error, Result};

/// A permission name as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// Permission name.
    #[serde(alias = "permission")]
    pub name: String,
}

impl PermissionEntry {
    /// Create an entry for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Body of `GET permissions/anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousPermissions {
    /// Whether an authenticated identity is required to use the application.
    pub identity_required: bool,
    /// Permissions granted without authentication.
    pub permissions: Vec<PermissionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnonymous {
    #[serde(alias = "isUserRequired")]
    identity_required: Option<bool>,
    permissions: Option<Vec<PermissionEntry>>,
}

impl AnonymousPermissions {
    /// Parse a response body, requiring both fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if a field is missing or mistyped.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawAnonymous = serde_json::from_value(value)
            .map_err(|e| Error::protocol(format!("anonymous permissions: {e}")))?;

        let identity_required = raw.identity_required.ok_or_else(|| {
            Error::protocol("anonymous permissions response is missing 'identityRequired'")
        })?;
        let permissions = raw.permissions.ok_or_else(|| {
            Error::protocol("anonymous permissions response is missing 'permissions'")
        })?;

        Ok(Self {
            identity_required,
            permissions,
        })
    }
}

/// Body of `POST sessions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionRequest<'a> {
    identity_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

impl<'a> From<&'a Credentials> for SessionRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            identity_name: credentials.identity_name(),
            password: credentials.password_secret(),
            token: credentials.token_secret(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSession {
    registered: Option<bool>,
    success: Option<bool>,
    token: Option<String>,
    permissions: Option<Vec<PermissionEntry>>,
}

/// Parsed body of `POST sessions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionReply {
    Registered {
        token: String,
        permissions: Vec<PermissionEntry>,
    },
    Rejected,
}

impl SessionReply {
    pub(crate) fn from_value(value: Value) -> Result<Self> {
        let raw: RawSession = serde_json::from_value(value)
            .map_err(|e| Error::protocol(format!("session: {e}")))?;

        let accepted = raw
            .registered
            .or(raw.success)
            .ok_or_else(|| Error::protocol("session response is missing 'registered'"))?;
        if !accepted {
            return Ok(Self::Rejected);
        }

        let token = raw
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::protocol("registered session response has no token"))?;
        if HeaderValue::from_str(&token).is_err() {
            return Err(Error::protocol(
                "registered session token is not a valid header value",
            ));
        }

        Ok(Self::Registered {
            token,
            permissions: raw.permissions.unwrap_or_default(),
        })
    }
}
