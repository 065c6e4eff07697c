//! Local PostgreSQL instance management.
//!
//! `LocalDbManager` drives `initdb`, `pg_ctl`, and `pg_isready` as child
//! processes. Integration tests use [`LocalDbManager::ephemeral`] to get a
//! throwaway cluster; developers can point it at a persistent data directory.

use std::ffi::OsStr;
use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::PgPool;
use tokio::process::Command;
use tokio::time::sleep;

use crate::error::{DataError, Result};

/// Default database name.
const DEFAULT_DATABASE: &str = "helpdesk";

/// Maximum time to wait for PostgreSQL to become ready.
const PG_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval when waiting for PostgreSQL readiness.
const PG_READY_POLL: Duration = Duration::from_millis(200);

/// Where the PostgreSQL binaries and data live.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// Directory containing `initdb`, `pg_ctl`, `pg_isready`.
    pub bin_dir: PathBuf,
    /// The PGDATA directory.
    pub data_dir: PathBuf,
    /// Listen port. 0 picks a free ephemeral port at start.
    pub port: u16,
    pub database_name: String,
}

impl PgConfig {
    /// Discovers the binaries via `pg_config --bindir` on PATH.
    pub async fn from_env(data_dir: PathBuf, database_name: &str) -> Result<Self> {
        let output = Command::new("pg_config")
            .arg("--bindir")
            .output()
            .await
            .map_err(|_| DataError::PgConfigNotFound)?;

        if !output.status.success() {
            return Err(DataError::PgConfigNotFound);
        }

        let bin_dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            bin_dir: PathBuf::from(bin_dir),
            data_dir,
            port: 0,
            database_name: database_name.to_string(),
        })
    }
}

/// Manages a local PostgreSQL cluster.
pub struct LocalDbManager {
    config: PgConfig,
    started: bool,
    /// Keeps an ephemeral data directory alive; removed on drop.
    _tempdir: Option<tempfile::TempDir>,
}

impl LocalDbManager {
    pub fn new(config: PgConfig) -> Self {
        Self {
            config,
            started: false,
            _tempdir: None,
        }
    }

    /// Uses `$APP_DATA/helpdesk/pgdata` as the data directory.
    pub async fn with_default_data_dir() -> Result<Self> {
        let data_dir = default_data_dir().ok_or(DataError::NoDataDir)?;
        let config = PgConfig::from_env(data_dir, DEFAULT_DATABASE).await?;
        Ok(Self::new(config))
    }

    /// A cluster in a temporary directory, deleted when the manager drops.
    pub async fn ephemeral() -> Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let data_dir = tempdir.path().join("pgdata");
        let config = PgConfig::from_env(data_dir, DEFAULT_DATABASE).await?;
        Ok(Self {
            config,
            started: false,
            _tempdir: Some(tempdir),
        })
    }

    /// Initializes the data directory unless it already exists.
    pub async fn setup(&mut self) -> Result<()> {
        if self.config.data_dir.join("PG_VERSION").exists() {
            log::info!("Data directory already initialized, skipping initdb");
            return Ok(());
        }

        log::info!("Initializing PostgreSQL data directory...");
        self.pg("initdb", [
            OsStr::new("-D"),
            self.config.data_dir.as_os_str(),
            OsStr::new("--no-locale"),
            OsStr::new("--encoding=UTF8"),
        ])
        .await?;
        Ok(())
    }

    /// Starts the server and creates the application database if missing.
    pub async fn start(&mut self) -> Result<()> {
        if self.config.port == 0 {
            self.config.port = find_free_port()?;
        }

        log::info!("Starting PostgreSQL on port {}...", self.config.port);
        let options = format!(
            "-p {} -k {} -h localhost",
            self.config.port,
            self.config.data_dir.display()
        );
        let logfile = self.config.data_dir.join("postgresql.log");
        self.pg("pg_ctl", [
            OsStr::new("-D"),
            self.config.data_dir.as_os_str(),
            OsStr::new("-o"),
            OsStr::new(&options),
            OsStr::new("-l"),
            logfile.as_os_str(),
            OsStr::new("start"),
        ])
        .await?;

        self.wait_for_ready().await?;
        self.started = true;
        self.create_database_if_missing().await?;

        log::info!(
            "Database '{}' ready at {}",
            self.config.database_name,
            self.connection_url()
        );
        Ok(())
    }

    /// Stops the server gracefully. No-op if it was never started.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.started {
            return Ok(());
        }

        log::info!("Stopping PostgreSQL...");
        self.pg("pg_ctl", [
            OsStr::new("-D"),
            self.config.data_dir.as_os_str(),
            OsStr::new("-m"),
            OsStr::new("fast"),
            OsStr::new("stop"),
        ])
        .await?;
        self.started = false;
        Ok(())
    }

    pub fn connection_url(&self) -> String {
        format!(
            "postgresql://localhost:{}/{}",
            self.config.port, self.config.database_name
        )
    }

    /// The listen port (0 until started).
    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Runs a binary from the PG bin directory, failing on non-zero exit.
    async fn pg<I, S>(&self, program: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(self.config.bin_dir.join(program))
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DataError::Command(format!("{program} failed: {stderr}")));
        }
        Ok(())
    }

    async fn wait_for_ready(&self) -> Result<()> {
        let pg_isready = self.config.bin_dir.join("pg_isready");
        let deadline = tokio::time::Instant::now() + PG_READY_TIMEOUT;

        loop {
            let output = Command::new(&pg_isready)
                .arg("-p")
                .arg(self.config.port.to_string())
                .arg("-h")
                .arg("localhost")
                .output()
                .await?;

            if output.status.success() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DataError::ReadyTimeout(PG_READY_TIMEOUT));
            }
            sleep(PG_READY_POLL).await;
        }
    }

    async fn create_database_if_missing(&self) -> Result<()> {
        let maintenance_url = format!("postgresql://localhost:{}/postgres", self.config.port);
        let pool = PgPool::connect(&maintenance_url).await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(&self.config.database_name)
                .fetch_one(&pool)
                .await?;

        if !exists {
            log::info!("Creating database '{}'...", self.config.database_name);
            // CREATE DATABASE cannot use bind parameters
            let sql = format!("CREATE DATABASE \"{}\"", self.config.database_name);
            sqlx::query(&sql).execute(&pool).await?;
        }

        pool.close().await;
        Ok(())
    }
}

impl Drop for LocalDbManager {
    fn drop(&mut self) {
        if self.started {
            // Best effort: tests that panic never reach `stop()`.
            let _ = std::process::Command::new(self.config.bin_dir.join("pg_ctl"))
                .arg("-D")
                .arg(&self.config.data_dir)
                .arg("-m")
                .arg("immediate")
                .arg("stop")
                .output();
        }
    }
}

fn find_free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Platform data directory for a persistent local cluster.
///
/// - macOS: `~/Library/Application Support/helpdesk/pgdata`
/// - Linux: `~/.local/share/helpdesk/pgdata`
/// - Windows: `%APPDATA%\helpdesk\pgdata`
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("helpdesk").join("pgdata"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_data_dir_ends_in_helpdesk() {
        let dir = default_data_dir().expect("data dir");
        assert!(dir.ends_with("helpdesk/pgdata") || dir.ends_with("helpdesk\\pgdata"));
    }

    #[test]
    fn connection_url_uses_port_and_name() {
        let mgr = LocalDbManager::new(PgConfig {
            bin_dir: PathBuf::from("/usr/lib/postgresql/bin"),
            data_dir: PathBuf::from("/tmp/pgdata"),
            port: 6543,
            database_name: "desk".into(),
        });
        assert_eq!(mgr.connection_url(), "postgresql://localhost:6543/desk");
        assert!(!mgr.is_started());
    }

    #[test]
    fn free_port_is_nonzero() {
        assert_ne!(find_free_port().unwrap(), 0);
    }
}
