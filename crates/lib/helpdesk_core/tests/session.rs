//! Session lifecycle against a live database.

mod common;

use std::time::Duration;

use chrono::Utc;
use common::TestDb;
use helpdesk_core::models::session::{NONCE_LEN, SESSION_ID_LEN};
use helpdesk_core::registry::agent::add_dept_agent;
use helpdesk_core::registry::dept::create_dept;
use helpdesk_core::session::{LoginResult, UpgradePendingResult};
use helpdesk_core::session::queries::{
    create_pending, delete_session, get_pendings, get_user_from_session, is_admin_session,
    is_head_session, purge_expired_sessions, set_admin_for_user,
};

const TTL: Duration = Duration::from_secs(600);

#[tokio::test]
async fn pending_round_trip() {
    let t = TestDb::start().await;

    let pending = create_pending(t.pool(), TTL).await.unwrap();
    assert_eq!(pending.session_id.len(), SESSION_ID_LEN);
    assert_eq!(pending.nonce.len(), NONCE_LEN);
    assert!(pending.expiration > Utc::now());
    assert_eq!(get_pendings(t.pool()).await.unwrap(), vec![pending.clone()]);

    let mut tx = t.db.begin().await.unwrap();
    let claim = tx.delete_pending(&pending.session_id).await.unwrap().unwrap();
    assert_eq!(claim.nonce, pending.nonce);
    assert_eq!(claim.expiration, pending.expiration);
    assert!(tx.delete_pending(&pending.session_id).await.unwrap().is_none());
    tx.commit().await.unwrap();

    assert!(get_pendings(t.pool()).await.unwrap().is_empty());
}

#[tokio::test]
async fn upgrade_resolves_user() {
    let t = TestDb::start().await;
    let pending = create_pending(t.pool(), TTL).await.unwrap();
    let sid = pending.session_id.clone();
    assert!(get_user_from_session(t.pool(), &sid).await.unwrap().is_none());

    let profile = common::profile("alice");
    let result = t
        .db
        .transaction(|tx| {
            let sid = sid.clone();
            let profile = profile.clone();
            Box::pin(async move {
                let claim = tx.delete_pending(&sid).await?.expect("pending exists");
                tx.upsert_user(&profile).await?;
                tx.upgrade_pending(&sid, &profile.user_id, claim.expiration)
                    .await
            })
        })
        .await
        .unwrap();
    assert_eq!(result, UpgradePendingResult::Success);

    let user = get_user_from_session(t.pool(), &sid).await.unwrap().unwrap();
    assert_eq!(user.user_id, "alice");
    assert!(!user.admin);
    assert_eq!(is_admin_session(t.pool(), &sid).await.unwrap(), Some(false));

    let freed = delete_session(t.pool(), &sid).await.unwrap().unwrap();
    assert_eq!(freed.user_id, "alice");
    assert!(delete_session(t.pool(), &sid).await.unwrap().is_none());
    assert!(get_user_from_session(t.pool(), &sid).await.unwrap().is_none());
}

#[tokio::test]
async fn upgrade_without_user_is_rolled_back() {
    let t = TestDb::start().await;
    let pending = create_pending(t.pool(), TTL).await.unwrap();

    let mut tx = t.db.begin().await.unwrap();
    let claim = tx.delete_pending(&pending.session_id).await.unwrap().unwrap();
    let result = tx
        .upgrade_pending(&pending.session_id, "nobody", claim.expiration)
        .await
        .unwrap();
    assert_eq!(result, UpgradePendingResult::NoUser);
    tx.rollback().await.unwrap();

    // The pending session survives the rollback.
    assert_eq!(get_pendings(t.pool()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn second_upgrade_is_already_active() {
    let t = TestDb::start().await;
    t.user("bob").await;
    let expiration = Utc::now() + chrono::Duration::hours(1);

    let mut tx = t.db.begin().await.unwrap();
    assert_eq!(
        tx.upgrade_pending("sid", "bob", expiration).await.unwrap(),
        UpgradePendingResult::Success
    );
    tx.commit().await.unwrap();

    let mut tx = t.db.begin().await.unwrap();
    assert_eq!(
        tx.upgrade_pending("sid", "bob", expiration).await.unwrap(),
        UpgradePendingResult::AlreadyActive
    );
}

#[tokio::test]
async fn admin_flag_returns_previous_value() {
    let t = TestDb::start().await;
    t.user("carol").await;

    assert_eq!(set_admin_for_user(t.pool(), "carol", true).await.unwrap(), Some(false));
    assert_eq!(set_admin_for_user(t.pool(), "carol", true).await.unwrap(), Some(true));
    assert_eq!(set_admin_for_user(t.pool(), "nobody", true).await.unwrap(), None);

    // Refreshing the profile keeps the flag.
    t.user("carol").await;
    assert_eq!(set_admin_for_user(t.pool(), "carol", false).await.unwrap(), Some(true));
}

#[tokio::test]
async fn head_session_collapses_missing_cases() {
    let t = TestDb::start().await;
    t.user("dave").await;
    let dept = create_dept(t.pool(), "Support").await.unwrap();
    let expiration = Utc::now() + chrono::Duration::hours(1);

    let mut tx = t.db.begin().await.unwrap();
    tx.upgrade_pending("dave-sid", "dave", expiration).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(is_head_session(t.pool(), "dave-sid", dept).await.unwrap(), None);
    add_dept_agent(t.pool(), dept, "dave", true).await.unwrap();
    assert_eq!(is_head_session(t.pool(), "dave-sid", dept).await.unwrap(), Some(true));
    assert_eq!(is_head_session(t.pool(), "bogus", dept).await.unwrap(), None);
}

#[tokio::test]
async fn purge_removes_only_expired() {
    let t = TestDb::start().await;
    t.user("erin").await;
    create_pending(t.pool(), Duration::ZERO).await.unwrap();
    create_pending(t.pool(), TTL).await.unwrap();

    let mut tx = t.db.begin().await.unwrap();
    tx.upgrade_pending("old", "erin", Utc::now() - chrono::Duration::minutes(1))
        .await
        .unwrap();
    tx.upgrade_pending("new", "erin", Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(get_user_from_session(t.pool(), "old").await.unwrap().is_none());

    let purged = purge_expired_sessions(t.pool()).await.unwrap();
    assert_eq!((purged.pending, purged.active), (1, 1));
    assert_eq!(get_pendings(t.pool()).await.unwrap().len(), 1);
    assert!(get_user_from_session(t.pool(), "new").await.unwrap().is_some());
}

#[tokio::test]
async fn login_uses_configured_ttl_and_verified_nonce() {
    let t = TestDb::start().await;
    let pending = t.db.create_pending().await.unwrap();
    let ttl = chrono::Duration::from_std(t.db.config().pending_ttl).unwrap();
    assert!(pending.expiration > Utc::now() + ttl - chrono::Duration::minutes(1));
    assert!(pending.expiration <= Utc::now() + ttl);

    let expected = pending.nonce.clone();
    let result = t
        .db
        .complete_login(&pending.session_id, |nonce| {
            (nonce == expected.as_slice()).then(|| common::profile("frank"))
        })
        .await
        .unwrap();
    assert_eq!(
        result,
        LoginResult::LoggedIn {
            user_id: "frank".into()
        }
    );
    let user = get_user_from_session(t.pool(), &pending.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.user_id, "frank");

    assert_eq!(
        t.db.complete_login(&pending.session_id, |_| Some(common::profile("frank")))
            .await
            .unwrap(),
        LoginResult::NoPending
    );
}

#[tokio::test]
async fn login_consumes_expired_and_rejected_pendings() {
    let t = TestDb::start().await;
    let expired = create_pending(t.pool(), Duration::ZERO).await.unwrap();
    let rejected = t.db.create_pending().await.unwrap();

    assert_eq!(
        t.db.complete_login(&expired.session_id, |_| Some(common::profile("gina")))
            .await
            .unwrap(),
        LoginResult::Expired
    );
    assert_eq!(
        t.db.complete_login(&rejected.session_id, |_| None)
            .await
            .unwrap(),
        LoginResult::Rejected
    );

    assert!(get_pendings(t.pool()).await.unwrap().is_empty());
    assert!(get_user_from_session(t.pool(), &expired.session_id).await.unwrap().is_none());
    assert!(get_user_from_session(t.pool(), &rejected.session_id).await.unwrap().is_none());
}
