//! Session queries.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use super::{LoginResult, Purged, UpgradePendingResult, token};
use crate::constraint::{ConstraintKey, ConstraintMap, StoreResultExt};
use crate::db::{Database, Transaction};
use crate::error::Result;
use crate::models::session::{Pending, PendingClaim, Session};
use crate::models::user::{Profile, User};

static UPGRADE_PENDING: LazyLock<ConstraintMap<UpgradePendingResult>> = LazyLock::new(|| {
    ConstraintMap::new()
        .referential(
            "sessions",
            "sessions_user_id_fkey",
            UpgradePendingResult::NoUser,
        )
        .unique(
            "sessions",
            "sessions_pkey",
            UpgradePendingResult::AlreadyActive,
        )
});

pub(crate) fn constraint_keys() -> Vec<ConstraintKey> {
    UPGRADE_PENDING.keys().collect()
}

/// Create a pending session expiring `ttl` from now. Returns the row exactly
/// as stored.
pub async fn create_pending(pool: &PgPool, ttl: Duration) -> Result<Pending> {
    let pending = sqlx::query_as::<_, Pending>(
        "INSERT INTO pendings (session_id, nonce, expiration) \
         VALUES ($1, $2, now() + $3 * INTERVAL '1 second') \
         RETURNING session_id, nonce, expiration",
    )
    .bind(token::session_id())
    .bind(token::nonce())
    .bind(ttl.as_secs_f64())
    .fetch_one(pool)
    .await?;
    debug!(expiration = %pending.expiration, "pending session created");
    Ok(pending)
}

impl Database {
    /// Create a pending session living for the configured pending TTL.
    pub async fn create_pending(&self) -> Result<Pending> {
        create_pending(self.pool(), self.config().pending_ttl).await
    }

    /// Finish a login started by [`Database::create_pending`].
    ///
    /// Consumes the pending session, hands its nonce to `verify`, and on a
    /// verified profile upserts the user and activates the session, all in
    /// one transaction.
    pub async fn complete_login(
        &self,
        sid: &str,
        verify: impl FnOnce(&[u8]) -> Option<Profile>,
    ) -> Result<LoginResult> {
        let mut tx = self.begin().await?;
        let Some(claim) = tx.delete_pending(sid).await? else {
            return Ok(LoginResult::NoPending);
        };

        let outcome = if claim.is_expired(Utc::now()) {
            LoginResult::Expired
        } else if let Some(profile) = verify(&claim.nonce) {
            tx.upsert_user(&profile).await?;
            match tx.upgrade_pending(sid, &profile.user_id, claim.expiration).await? {
                UpgradePendingResult::Success => LoginResult::LoggedIn {
                    user_id: profile.user_id,
                },
                failed => {
                    tx.rollback().await?;
                    return Ok(LoginResult::NotUpgraded(failed));
                }
            }
        } else {
            LoginResult::Rejected
        };
        tx.commit().await?;
        if !matches!(outcome, LoginResult::LoggedIn { .. }) {
            debug!(?outcome, "login not completed");
        }
        Ok(outcome)
    }
}

impl Transaction {
    /// Consume a pending session, returning its nonce and expiration.
    ///
    /// Returns `None` if the session never existed or was already consumed.
    /// Run this in the same transaction as [`Transaction::upgrade_pending`].
    pub async fn delete_pending(&mut self, sid: &str) -> Result<Option<PendingClaim>> {
        let claim = sqlx::query_as::<_, PendingClaim>(
            "DELETE FROM pendings WHERE session_id = $1 RETURNING nonce, expiration",
        )
        .bind(sid)
        .fetch_optional(self.conn())
        .await?;
        Ok(claim)
    }

    /// Create or refresh a user's profile. Never changes the admin flag.
    pub async fn upsert_user(&mut self, profile: &Profile) -> Result<()> {
        profile.validate()?;
        sqlx::query(
            "INSERT INTO users (user_id, name, email, picture) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE \
             SET name = EXCLUDED.name, email = EXCLUDED.email, picture = EXCLUDED.picture",
        )
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.picture)
        .execute(self.conn())
        .await?;
        Ok(())
    }

    /// Turn a just-consumed pending session into an active one for `uid`.
    ///
    /// Any outcome other than `Success` leaves the transaction aborted; the
    /// caller must roll back.
    pub async fn upgrade_pending(
        &mut self,
        sid: &str,
        uid: &str,
        expiration: chrono::DateTime<chrono::Utc>,
    ) -> Result<UpgradePendingResult> {
        let attempt = sqlx::query(
            "INSERT INTO sessions (session_id, user_id, expiration) VALUES ($1, $2, $3)",
        )
        .bind(sid)
        .bind(uid)
        .bind(expiration)
        .execute(self.conn())
        .await
        .store_result()?;

        let result = UPGRADE_PENDING.resolve(attempt, |_| UpgradePendingResult::Success)?;
        if result == UpgradePendingResult::Success {
            info!(user_id = uid, "session upgraded");
        }
        Ok(result)
    }
}

/// Resolve an active, unexpired session to its user.
pub async fn get_user_from_session(pool: &PgPool, sid: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT u.user_id, u.name, u.email, u.picture, u.admin \
         FROM sessions s JOIN users u ON u.user_id = s.user_id \
         WHERE s.session_id = $1 AND s.expiration > now()",
    )
    .bind(sid)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// The admin flag of the session's user, or `None` if the session is invalid.
pub async fn is_admin_session(pool: &PgPool, sid: &str) -> Result<Option<bool>> {
    let admin = sqlx::query_scalar::<_, bool>(
        "SELECT u.admin FROM sessions s JOIN users u ON u.user_id = s.user_id \
         WHERE s.session_id = $1 AND s.expiration > now()",
    )
    .bind(sid)
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}

/// The head flag of the session's user within `dept_id`.
///
/// `None` when the session is invalid *or* the user is not an agent of the
/// department. Callers that must tell the two apart resolve the session with
/// [`get_user_from_session`] first.
pub async fn is_head_session(pool: &PgPool, sid: &str, dept_id: i32) -> Result<Option<bool>> {
    let head = sqlx::query_scalar::<_, bool>(
        "SELECT a.head FROM sessions s \
         JOIN dept_agents a ON a.user_id = s.user_id \
         WHERE s.session_id = $1 AND s.expiration > now() AND a.dept_id = $2",
    )
    .bind(sid)
    .bind(dept_id)
    .fetch_optional(pool)
    .await?;
    Ok(head)
}

/// Log out. Returns the freed session, or `None` if there was none.
pub async fn delete_session(pool: &PgPool, sid: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        "DELETE FROM sessions WHERE session_id = $1 \
         RETURNING session_id, user_id, expiration",
    )
    .bind(sid)
    .fetch_optional(pool)
    .await?;
    if let Some(session) = &session {
        info!(user_id = %session.user_id, "session deleted");
    }
    Ok(session)
}

/// Set a user's admin flag, returning the previous value, or `None` if the
/// user does not exist.
pub async fn set_admin_for_user(pool: &PgPool, uid: &str, admin: bool) -> Result<Option<bool>> {
    let previous = sqlx::query_scalar::<_, bool>(
        "UPDATE users u SET admin = $2 \
         FROM (SELECT user_id, admin FROM users WHERE user_id = $1 FOR UPDATE) old \
         WHERE u.user_id = old.user_id \
         RETURNING old.admin",
    )
    .bind(uid)
    .bind(admin)
    .fetch_optional(pool)
    .await?;

    if previous == Some(admin) {
        warn!(user_id = uid, admin, "admin flag already set");
    }
    Ok(previous)
}

/// All pending sessions.
pub async fn get_pendings(pool: &PgPool) -> Result<Vec<Pending>> {
    let rows = sqlx::query_as::<_, Pending>(
        "SELECT session_id, nonce, expiration FROM pendings ORDER BY expiration",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Delete every expired pending and active session.
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<Purged> {
    let mut tx = pool.begin().await?;
    let pending = sqlx::query("DELETE FROM pendings WHERE expiration <= now()")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let active = sqlx::query("DELETE FROM sessions WHERE expiration <= now()")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    info!(pending, active, "expired sessions purged");
    Ok(Purged { pending, active })
}
