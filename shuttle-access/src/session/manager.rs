//! Session manager owning identity, token and permissions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::Credentials;
use super::api::{AnonymousPermissions, SessionReply, SessionRequest};
use crate::config::{AccessConfig, normalize_base_url};
use crate::error::{ConfigError, Error, Result};
use crate::http::{ApiRequest, SessionTokenHeader, Transport};
use crate::permission::{PermissionKind, PermissionSet};
use crate::storage::{CredentialStore, StorageKeys};

const ANONYMOUS_PERMISSIONS_PATH: &str = "permissions/anonymous";
const SESSIONS_PATH: &str = "sessions";

// ============================================================================
// Session State
// ============================================================================

/// Derived login status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginStatus {
    /// The server requires an authenticated identity.
    IdentityRequired,
    /// Anonymous session.
    NotLoggedIn,
    /// Authenticated session.
    LoggedIn,
}

impl LoginStatus {
    /// Wire spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdentityRequired => "identity-required",
            Self::NotLoggedIn => "not-logged-in",
            Self::LoggedIn => "logged-in",
        }
    }
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a [`Access::login`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The server issued a session.
    Authenticated,
    /// A token re-authentication was refused; the session is anonymous again.
    TokenRejected,
}

/// Result of [`Access::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialized {
    /// The anonymous permissions response.
    pub anonymous: AnonymousPermissions,
    /// Outcome of the automatic token login, if one was attempted.
    pub login: Option<LoginOutcome>,
}

/// Identity, token and permissions of the current session.
///
/// A non-empty token means an authenticated session is active. While
/// `identity_required` is set, identity name and token are empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    identity_name: String,
    token: String,
    identity_required: bool,
    permissions: PermissionSet,
    anonymous: Vec<String>,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("identity_name", &self.identity_name)
            .field("has_token", &!self.token.is_empty())
            .field("identity_required", &self.identity_required)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Authenticated identity name, empty when anonymous.
    #[must_use]
    pub fn identity_name(&self) -> &str {
        &self.identity_name
    }

    /// Session token, empty when anonymous.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the server requires an authenticated identity.
    #[must_use]
    pub const fn identity_required(&self) -> bool {
        self.identity_required
    }

    /// The granted permissions.
    #[must_use]
    pub const fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns `true` while an authenticated session is active.
    #[must_use]
    pub fn has_session(&self) -> bool {
        !self.token.is_empty()
    }

    /// Status derived from the state.
    #[must_use]
    pub fn login_status(&self) -> LoginStatus {
        if self.identity_required {
            LoginStatus::IdentityRequired
        } else if self.token.is_empty() {
            LoginStatus::NotLoggedIn
        } else {
            LoginStatus::LoggedIn
        }
    }

    /// Replace the anonymous grant, returning how many entries were dropped
    /// and how many were added.
    fn replace_anonymous(&mut self, names: Vec<String>) -> (usize, usize) {
        let replaced = self.permissions.remove_kind(PermissionKind::Anonymous);
        self.anonymous = names;
        (replaced, self.merge_anonymous())
    }

    /// Add the anonymous grant back, skipping names already covered.
    fn merge_anonymous(&mut self) -> usize {
        let mut added = 0_usize;
        for name in &self.anonymous {
            if self.permissions.add(PermissionKind::Anonymous, name.as_str()) {
                added += 1;
            }
        }
        added
    }

    /// Forget the identity. Anonymous names shadowed by identity permissions
    /// become visible again.
    fn clear_identity(&mut self) {
        self.identity_name.clear();
        self.token.clear();
        self.permissions.remove_kind(PermissionKind::Identity);
        self.merge_anonymous();
    }
}

// ============================================================================
// Access
// ============================================================================

#[derive(Debug, Clone)]
struct Endpoints {
    anonymous: Url,
    sessions: Url,
}

/// Session and permission client for an access server.
///
/// Mutating operations take `&mut self`, so calls on one instance never
/// overlap. To share an instance between tasks, wrap it in a
/// `tokio::sync::Mutex`; overlapping calls then queue on the lock.
///
/// # Example
///
/// ```rust,ignore
/// use shuttle_access::{Access, Credentials, ReqwestTransport};
/// use shuttle_access::storage::FileStore;
///
/// let mut access = Access::builder()
///     .base_url("https://access.example.com/api")
///     .transport(ReqwestTransport::builder().build()?)
///     .store(FileStore::default_path())
///     .build()?;
///
/// access.initialize().await?;
/// if !access.has_session() {
///     access.login(&Credentials::password("admin", "secret")).await?;
/// }
/// assert!(access.has_permission("system://manage"));
/// ```
pub struct Access {
    base_url: Url,
    endpoints: Endpoints,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    keys: StorageKeys,
    state: SessionState,
}

impl fmt::Debug for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Access")
            .field("base_url", &self.base_url)
            .field("keys", &self.keys)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Access {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> AccessBuilder {
        AccessBuilder::default()
    }

    /// Build a client from `config` with a `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &AccessConfig, store: impl CredentialStore + 'static) -> Result<Self> {
        config.validate()?;
        let transport = config.transport()?;
        Self::builder()
            .config(config)
            .transport(transport)
            .store(store)
            .build()
    }

    /// The normalised base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Authenticated identity name, empty when anonymous.
    #[must_use]
    pub fn identity_name(&self) -> &str {
        self.state.identity_name()
    }

    /// Session token, empty when anonymous.
    #[must_use]
    pub fn token(&self) -> &str {
        self.state.token()
    }

    /// Whether the server requires an authenticated identity.
    #[must_use]
    pub const fn identity_required(&self) -> bool {
        self.state.identity_required()
    }

    /// The granted permissions.
    #[must_use]
    pub const fn permissions(&self) -> &PermissionSet {
        self.state.permissions()
    }

    /// Returns `true` while an authenticated session is active.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.state.has_session()
    }

    /// Current login status.
    #[must_use]
    pub fn login_status(&self) -> LoginStatus {
        self.state.login_status()
    }

    /// Returns `true` if `name` is granted, ignoring case. A granted `*`
    /// matches every name.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.state.permissions.contains(name)
    }

    /// Grants `name` under `kind` unless it is already granted.
    pub fn add_permission(&mut self, kind: PermissionKind, name: impl Into<String>) {
        self.state.permissions.add(kind, name);
    }

    /// Revokes `name`, ignoring case.
    pub fn remove_permission(&mut self, name: &str) {
        self.state.permissions.remove(name);
    }

    /// Revokes every permission of `kind`.
    pub fn remove_permissions_by_kind(&mut self, kind: PermissionKind) {
        self.state.permissions.remove_kind(kind);
    }

    /// Fetch anonymous permissions and resume a persisted session.
    ///
    /// Anonymous permissions from an earlier call are replaced. When the
    /// server does not require an identity and the store holds an identity
    /// name and token, a token login follows.
    ///
    /// # Errors
    ///
    /// Returns transport errors, [`Error::Protocol`] for a malformed response,
    /// storage errors, and any error of the automatic login.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn initialize(&mut self) -> Result<Initialized> {
        let body = self
            .send(ApiRequest::get(self.endpoints.anonymous.clone()))
            .await?;
        let anonymous = AnonymousPermissions::from_value(body)?;

        let names = anonymous.permissions.iter().map(|entry| entry.name.clone());
        let (replaced, added) = self.state.replace_anonymous(names.collect());
        self.state.identity_required = anonymous.identity_required;
        debug!(
            replaced,
            added,
            identity_required = anonymous.identity_required,
            "merged anonymous permissions"
        );

        if anonymous.identity_required {
            self.state.clear_identity();
            info!("identity required, persisted credentials ignored");
            return Ok(Initialized {
                anonymous,
                login: None,
            });
        }

        let Some(credentials) = self.persisted_credentials()? else {
            return Ok(Initialized {
                anonymous,
                login: None,
            });
        };

        debug!(identity = %credentials.identity_name(), "resuming persisted session");
        let outcome = self.login(&credentials).await?;
        Ok(Initialized {
            anonymous,
            login: Some(outcome),
        })
    }

    /// Log in with a password or re-authenticate with a token.
    ///
    /// On success the identity is persisted and identity permissions are
    /// replaced by the server's list. A refused token clears the session and
    /// returns [`LoginOutcome::TokenRejected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] before any request if the credential is
    /// incomplete, [`Error::Authentication`] if a password login is refused,
    /// [`Error::Protocol`] for a malformed response, and transport or storage
    /// errors unchanged.
    #[instrument(skip(self, credentials), fields(identity = %credentials.identity_name()))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginOutcome> {
        credentials.validate()?;

        let body = serde_json::to_value(SessionRequest::from(credentials))?;
        let reply = self
            .send(ApiRequest::post(self.endpoints.sessions.clone(), body))
            .await?;

        match SessionReply::from_value(reply)? {
            SessionReply::Registered { token, permissions } => {
                self.persist(credentials.identity_name(), &token)?;

                self.state.identity_name = credentials.identity_name().to_string();
                self.state.token = token;
                self.state.identity_required = false;

                self.state.permissions.remove_kind(PermissionKind::Identity);
                for entry in permissions {
                    self.state.permissions.add(PermissionKind::Identity, entry.name);
                }
                self.state.merge_anonymous();

                info!(
                    permissions = self.state.permissions.names_of(PermissionKind::Identity).count(),
                    "logged in"
                );
                Ok(LoginOutcome::Authenticated)
            }
            SessionReply::Rejected if credentials.uses_token() => {
                info!("session token rejected, reverting to anonymous");
                self.drop_identity();
                Ok(LoginOutcome::TokenRejected)
            }
            SessionReply::Rejected => {
                warn!("login rejected");
                Err(Error::Authentication)
            }
        }
    }

    /// End the authenticated session and forget the persisted credential.
    pub fn logout(&mut self) {
        self.drop_identity();
        info!("logged out");
    }

    fn drop_identity(&mut self) {
        self.state.clear_identity();

        for key in [&self.keys.identity, &self.keys.token] {
            if let Err(e) = self.store.remove_item(key) {
                warn!(key = %key, error = %e, "failed to remove persisted credential");
            }
        }
    }

    /// Write identity and token. If the token cannot be written, the previous
    /// identity is put back so the pair never mixes two sessions.
    fn persist(&self, identity: &str, token: &str) -> Result<()> {
        let previous = self.store.get_item(&self.keys.identity)?;
        self.store.set_item(&self.keys.identity, identity)?;

        if let Err(e) = self.store.set_item(&self.keys.token, token) {
            let restored = match previous {
                Some(previous) => self.store.set_item(&self.keys.identity, &previous),
                None => self.store.remove_item(&self.keys.identity),
            };
            if let Err(restore) = restored {
                warn!(error = %restore, "failed to restore persisted identity");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn persisted_credentials(&self) -> Result<Option<Credentials>> {
        let identity = self.store.get_item(&self.keys.identity)?.unwrap_or_default();
        let token = self.store.get_item(&self.keys.token)?.unwrap_or_default();

        if identity.is_empty() || token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credentials::token(identity, token)))
    }

    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let decorator = SessionTokenHeader::new(&self.state.token);
        Ok(self.transport.send(request, &decorator).await?)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Access`].
///
/// Base URL, transport and store are required.
#[derive(Default)]
pub struct AccessBuilder {
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    keys: StorageKeys,
}

impl fmt::Debug for AccessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessBuilder")
            .field("base_url", &self.base_url)
            .field("has_transport", &self.transport.is_some())
            .field("has_store", &self.store.is_some())
            .field("keys", &self.keys)
            .finish()
    }
}

impl AccessBuilder {
    /// Set the access server base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set a transport shared with other owners.
    #[must_use]
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the credential store.
    #[must_use]
    pub fn store(mut self, store: impl CredentialStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set a credential store shared with other owners.
    #[must_use]
    pub fn shared_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the keys the credential is persisted under.
    #[must_use]
    pub fn storage_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Take base URL and storage keys from `config`.
    #[must_use]
    pub fn config(self, config: &AccessConfig) -> Self {
        self.base_url(config.base_url.clone())
            .storage_keys(config.storage_keys())
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL is missing or invalid, a
    /// storage key is empty, or the transport or store was not set.
    pub fn build(self) -> Result<Access> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::config_missing("base_url"))?;
        let base_url = normalize_base_url(&base_url)?;

        if self.keys.identity.is_empty() || self.keys.token.is_empty() {
            return Err(Error::config_missing("storage key"));
        }
        let transport = self
            .transport
            .ok_or_else(|| Error::config_missing("transport"))?;
        let store = self.store.ok_or_else(|| Error::config_missing("storage"))?;

        let join = |path: &str| {
            base_url
                .join(path)
                .map_err(|e| ConfigError::invalid(format!("endpoint '{path}': {e}")))
        };
        let endpoints = Endpoints {
            anonymous: join(ANONYMOUS_PERMISSIONS_PATH)?,
            sessions: join(SESSIONS_PATH)?,
        };

        debug!(base_url = %base_url, "access client built");
        Ok(Access {
            base_url,
            endpoints,
            transport,
            store,
            keys: self.keys,
            state: SessionState::default(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
