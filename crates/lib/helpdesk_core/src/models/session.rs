//! Pending and active sessions.

use chrono::{DateTime, Utc};

/// Length of a generated session id.
pub const SESSION_ID_LEN: usize = 64;
/// Length of a pending session's nonce in bytes.
pub const NONCE_LEN: usize = 64;

/// A session issued before the identity provider has vouched for the user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Pending {
    pub session_id: String,
    pub nonce: Vec<u8>,
    pub expiration: DateTime<Utc>,
}

/// What a consumed pending session yields for verification.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingClaim {
    pub nonce: Vec<u8>,
    pub expiration: DateTime<Utc>,
}

impl PendingClaim {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }
}

/// A session bound to a verified user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub expiration: DateTime<Utc>,
}
