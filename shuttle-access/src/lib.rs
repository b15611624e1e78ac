#![cfg_attr(docsrs, feature(doc_cfg))]
//! Session and permission client for Shuttle access servers.
//!
//! [`Access`] fetches the anonymous permissions of an application, resumes a
//! persisted session, logs identities in and out, and answers permission
//! checks synchronously.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use shuttle_access::prelude::*;
//!
//! let config = AccessConfig::from_env()?;
//! let mut access = Access::from_config(&config, FileStore::default_path())?;
//!
//! access.initialize().await?;
//! if access.login_status() == LoginStatus::NotLoggedIn {
//!     access.login(&Credentials::password("admin", "secret")).await?;
//! }
//! if access.has_permission("system://manage") {
//!     // ...
//! }
//! ```
//!
//! The HTTP transport and the credential store are injected: see
//! [`http::Transport`] and [`storage::CredentialStore`].

pub mod config;
pub mod error;
pub mod http;
pub mod permission;
pub mod prelude;
pub mod session;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;

pub use config::AccessConfig;
pub use error::{Error, Result};
pub use crate::http::ReqwestTransport;
pub use permission::{Permission, PermissionKind, PermissionSet};
pub use session::{Access, AccessBuilder, Credentials, Initialized, LoginOutcome, LoginStatus};
