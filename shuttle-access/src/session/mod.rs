//! Session lifecycle: anonymous permissions, login, logout.
//!
//! [`Access`] moves between three states:
//!
//! - **identity required**: the server demands a login, nothing persisted is
//!   used;
//! - **anonymous**: only anonymous permissions are granted;
//! - **authenticated**: a token is held and identity permissions are granted.
//!
//! [`Access::initialize`] enters one of the first two and may continue into
//! the third by re-authenticating with a persisted token.
//! [`Access::login`] enters it explicitly, [`Access::logout`] or a refused
//! token leaves it.

mod api;
mod credentials;
mod manager;

pub use api::{AnonymousPermissions, PermissionEntry};
pub use credentials::Credentials;
pub use manager::{Access, AccessBuilder, Initialized, LoginOutcome, LoginStatus, SessionState};
