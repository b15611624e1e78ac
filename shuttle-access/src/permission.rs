//! Permission records and the active permission set.
//!
//! Permission checks are flat: a query matches a stored permission when the
//! names are equal ignoring case, and a stored [`WILDCARD`] matches any query.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission name granting everything.
pub const WILDCARD: &str = "*";

/// Where a permission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    /// Granted without authentication, replaced on every initialize.
    Anonymous,
    /// Granted to the authenticated identity, replaced on every login.
    Identity,
}

impl PermissionKind {
    /// Wire spelling of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single granted permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    kind: PermissionKind,
    name: String,
}

impl Permission {
    /// Create a permission of the given kind.
    #[must_use]
    pub fn new(kind: PermissionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// The permission's kind.
    #[must_use]
    pub const fn kind(&self) -> PermissionKind {
        self.kind
    }

    /// The permission's name as granted.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this is the [`WILDCARD`] permission.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    fn matches_lowercase(&self, query: &str) -> bool {
        self.is_wildcard() || self.name.to_lowercase() == query
    }
}

/// The permissions currently granted to a session.
///
/// Names are unique ignoring case: [`add`](Self::add) skips any name that
/// [`contains`](Self::contains) already reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    entries: Vec<Permission>,
}

impl PermissionSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns `true` if `name` is granted, directly or through [`WILDCARD`].
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let query = name.to_lowercase();
        self.entries.iter().any(|p| p.matches_lowercase(&query))
    }

    /// Grants `name` under `kind` unless it is already granted.
    ///
    /// Returns `true` if the permission was appended.
    pub fn add(&mut self, kind: PermissionKind, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }

        self.entries.push(Permission::new(kind, name));
        true
    }

    /// Removes entries named `name` (ignoring case). Returns how many went.
    pub fn remove(&mut self, name: &str) -> usize {
        let query = name.to_lowercase();
        let before = self.entries.len();
        self.entries.retain(|p| p.name.to_lowercase() != query);
        before - self.entries.len()
    }

    /// Removes every entry of `kind`. Returns how many went.
    pub fn remove_kind(&mut self, kind: PermissionKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.kind != kind);
        before - self.entries.len()
    }

    /// Iterates over the granted permissions in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.entries.iter()
    }

    /// Iterates over the names granted under `kind`.
    pub fn names_of(&self, kind: PermissionKind) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |p| p.kind == kind)
            .map(Permission::name)
    }

    /// Number of granted permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
