//! Shared setup for integration tests: an ephemeral PostgreSQL cluster with
//! the schema migrated.

#![allow(dead_code)]

use helpdesk_core::local::LocalDbManager;
use helpdesk_core::models::user::Profile;
use helpdesk_core::{Database, StoreConfig};
use tracing_subscriber::EnvFilter;

pub struct TestDb {
    pub db: Database,
    // Dropped after `db`, so the pool closes before the cluster stops.
    _manager: LocalDbManager,
}

impl TestDb {
    /// Starts a fresh cluster with the schema migrated. Panics when
    /// PostgreSQL cannot be started.
    pub async fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mut manager = LocalDbManager::ephemeral().await.expect("db ephemeral");
        manager.setup().await.expect("db setup");
        manager.start().await.expect("db start");

        let db = Database::connect(StoreConfig::new(manager.connection_url()))
            .await
            .expect("connect to ephemeral PG");
        db.migrate().await.expect("migrate");
        Self {
            db,
            _manager: manager,
        }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        self.db.pool()
    }

    /// Creates (or refreshes) a user with a profile derived from `uid`.
    pub async fn user(&self, uid: &str) {
        let profile = profile(uid);
        let mut tx = self.db.begin().await.expect("begin");
        tx.upsert_user(&profile).await.expect("upsert user");
        tx.commit().await.expect("commit");
    }
}

pub fn profile(uid: &str) -> Profile {
    Profile {
        user_id: uid.into(),
        name: format!("User {uid}"),
        email: format!("{uid}@example.com"),
        picture: "http://example.com/avatar.png".into(),
    }
}
