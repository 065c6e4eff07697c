//! Session lifecycle.
//!
//! A login starts with a pending session carrying a nonce for the identity
//! provider round-trip. When the provider's callback verifies, the pending
//! session is consumed, the user upserted, and an active session created, all
//! in one transaction.

pub mod queries;
pub mod token;

/// Outcome of [`crate::Transaction::upgrade_pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradePendingResult {
    /// The active session now exists.
    Success,
    /// The user was not upserted first.
    NoUser,
    /// An active session with this id already exists.
    AlreadyActive,
}

/// Outcome of [`crate::Database::complete_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    /// The pending session is now active for this user.
    LoggedIn { user_id: String },
    /// The pending session never existed or was already consumed.
    NoPending,
    /// The pending session had expired. It is consumed anyway.
    Expired,
    /// The identity provider's answer did not verify against the nonce. The
    /// pending session is consumed anyway.
    Rejected,
    /// The upgrade insert failed; nothing was committed.
    NotUpgraded(UpgradePendingResult),
}

/// Rows removed by [`queries::purge_expired_sessions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Purged {
    pub pending: u64,
    pub active: u64,
}
