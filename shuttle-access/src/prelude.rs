//! Common imports for working with shuttle-access.

pub use crate::config::AccessConfig;
pub use crate::error::{ConfigError, Error, Result, StorageError};
pub use crate::http::{ApiRequest, RequestDecorator, ReqwestTransport, Transport};
pub use crate::permission::{Permission, PermissionKind, PermissionSet, WILDCARD};
pub use crate::session::{
    Access, AccessBuilder, AnonymousPermissions, Credentials, Initialized, LoginOutcome,
    LoginStatus, SessionState,
};
pub use crate::storage::{CredentialStore, FileStore, MemoryStore, StorageKeys};
