//! Connection pool and transaction handles.
//!
//! A [`Database`] is constructed once at startup and threaded explicitly
//! through every caller. Closing it consumes the handle, so the pool cannot
//! be torn down twice or used after teardown.

use futures_util::future::BoxFuture;
use sqlx::Postgres;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::constraint;
use crate::error::{DataError, Result};

/// Schema migrations embedded from `helpdesk_core/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Owns the process-wide connection pool.
#[derive(Debug)]
pub struct Database {
    pool: PgPool,
    config: StoreConfig,
}

impl Database {
    /// Opens a pool against `config.database_url`.
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        info!(
            max_connections = config.max_connections,
            "connecting to PostgreSQL"
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool, config })
    }

    /// The underlying pool; every query function takes this.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The configuration this handle was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Runs the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        info!("running database migrations");
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Checks that every constraint named by an operation's constraint map
    /// exists in the live schema with a matching kind.
    pub async fn verify_constraints(&self) -> Result<()> {
        let keys = constraint::declared();
        for key in &keys {
            let contype = sqlx::query_scalar::<_, String>(
                "SELECT contype::text FROM pg_constraint \
                 WHERE conrelid = to_regclass($1) AND conname = $2",
            )
            .bind(key.table)
            .bind(key.constraint)
            .fetch_optional(&self.pool)
            .await?;

            match contype {
                Some(kind) if key.class.raised_by(&kind) => {}
                _ => {
                    return Err(DataError::MissingConstraint {
                        table: key.table,
                        constraint: key.constraint,
                    });
                }
            }
        }
        info!(count = keys.len(), "constraint table verified");
        Ok(())
    }

    /// Starts a transaction. Dropping the handle without committing rolls
    /// back every statement issued on it.
    pub async fn begin(&self) -> Result<Transaction> {
        let inner = self.pool.begin().await?;
        Ok(Transaction { inner })
    }

    /// Runs `scope` inside a transaction, committing on `Ok` and rolling back
    /// on `Err`.
    ///
    /// ```ignore
    /// let uid = db
    ///     .transaction(|tx| Box::pin(async move {
    ///         let claim = tx.delete_pending(&sid).await?;
    ///         // ...
    ///         Ok(uid)
    ///     }))
    ///     .await?;
    /// ```
    pub async fn transaction<T, F>(&self, scope: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Transaction) -> BoxFuture<'t, Result<T>>,
    {
        let mut tx = self.begin().await?;
        match scope(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(self) {
        self.pool.close().await;
        info!("connection pool closed");
    }
}

/// A transaction-scoped handle.
///
/// Session upgrade queries live on this type (see [`crate::session::queries`])
/// so they can only run inside a transaction.
pub struct Transaction {
    inner: sqlx::Transaction<'static, Postgres>,
}

impl Transaction {
    pub async fn commit(self) -> Result<()> {
        self.inner.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.inner.rollback().await?;
        Ok(())
    }

    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        &mut self.inner
    }
}
