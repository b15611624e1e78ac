//! Persisted credential storage.
//!
//! A [`CredentialStore`] is a small string key-value store with the same
//! shape as a browser's `localStorage`. [`Access`](crate::Access) keeps the
//! authenticated identity name and session token in it so a later process can
//! resume the session.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageResult;

/// Default key for the persisted identity name.
pub const DEFAULT_IDENTITY_KEY: &str = "identity-name";

/// Default key for the persisted session token.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// String key-value store for persisted credentials.
///
/// Implementations use interior mutability and must be `Send + Sync`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement the `CredentialStore` trait",
    label = "this type cannot persist credentials",
    note = "a store needs `get_item`, `set_item` and `remove_item`"
)]
pub trait CredentialStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

/// Keys under which the credential is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// Key for the identity name.
    pub identity: String,
    /// Key for the session token.
    pub token: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            identity: DEFAULT_IDENTITY_KEY.to_string(),
            token: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}
