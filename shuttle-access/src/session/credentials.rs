//! Login credentials.

use std::fmt;

use crate::error::{Error, Result};

/// Identity name plus a password or a previously issued session token.
///
/// Empty strings count as absent. A credential carrying a token is a
/// token-based re-authentication, even if a password is also present.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    identity_name: String,
    password: Option<String>,
    token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity_name", &self.identity_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Start a credential for `identity_name` with no secret yet.
    #[must_use]
    pub fn new(identity_name: impl Into<String>) -> Self {
        Self {
            identity_name: identity_name.into(),
            password: None,
            token: None,
        }
    }

    /// Password credential for an explicit login.
    #[must_use]
    pub fn password(identity_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(identity_name).with_password(password)
    }

    /// Token credential for re-authentication.
    #[must_use]
    pub fn token(identity_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(identity_name).with_token(token)
    }

    /// Set the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into()).filter(|p: &String| !p.is_empty());
        self
    }

    /// Set the token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    /// The identity name.
    #[must_use]
    pub fn identity_name(&self) -> &str {
        &self.identity_name
    }

    pub(crate) fn password_secret(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub(crate) fn token_secret(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns `true` if this credential re-authenticates with a token.
    #[must_use]
    pub const fn uses_token(&self) -> bool {
        self.token.is_some()
    }

    /// Checks that an identity name and a password or token are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.identity_name.is_empty() || (self.password.is_none() && self.token.is_none()) {
            return Err(Error::Credentials);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Credentials::password("u", "p").validate().is_ok());
        assert!(Credentials::token("u", "t").validate().is_ok());

        assert!(matches!(
            Credentials::default().validate(),
            Err(Error::Credentials)
        ));
        assert!(matches!(
            Credentials::new("u").validate(),
            Err(Error::Credentials)
        ));
        assert!(matches!(
            Credentials::password("", "p").validate(),
            Err(Error::Credentials)
        ));
        assert!(matches!(
            Credentials::password("u", "").validate(),
            Err(Error::Credentials)
        ));
    }

    #[test]
    fn test_token_wins_over_password() {
        let credentials = Credentials::password("u", "p").with_token("t");
        assert!(credentials.uses_token());
        assert!(!Credentials::password("u", "p").uses_token());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", Credentials::password("u", "hunter2").with_token("t0k3n"));
        assert!(debug.contains("\"u\""));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("t0k3n"));
    }
}
