//! Authorization predicates.
//!
//! Every predicate answers with a [`Permission`]. `Unknown` means a resource
//! the question is about (ticket or department) does not exist, so there is
//! nothing to allow or deny. Callers map `Unknown` to "not found" and
//! `Denied` to "forbidden", and must never treat the two alike.

pub mod queries;

use serde::{Deserialize, Serialize};

/// Tri-state authorization answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// The ticket or department does not exist.
    Unknown,
    /// The resource exists and the principal may not act on it.
    Denied,
    Allowed,
}

/// `NULL` from SQL is `Unknown`.
impl From<Option<bool>> for Permission {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unknown,
            Some(false) => Self::Denied,
            Some(true) => Self::Allowed,
        }
    }
}

impl From<Permission> for Option<bool> {
    fn from(value: Permission) -> Self {
        match value {
            Permission::Unknown => None,
            Permission::Denied => Some(false),
            Permission::Allowed => Some(true),
        }
    }
}
