//! Store configuration.

use std::time::Duration;

/// Default PostgreSQL connection URL.
const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/helpdesk";

/// Default size of the connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a pooled connection.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default lifetime of a pending (pre-login) session.
const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(600);

/// Configuration for the connection pool and session lifetimes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long an operation waits to acquire a connection.
    pub acquire_timeout: Duration,
    /// How long a pending session stays valid while the identity provider
    /// round-trip completes.
    pub pending_ttl: Duration,
}

impl StoreConfig {
    /// Creates a configuration for the given URL with default pool settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            pending_ttl: DEFAULT_PENDING_TTL,
        }
    }

    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                        | Default                                  |
    /// |---------------------------------|------------------------------------------|
    /// | `DATABASE_URL`                  | `postgres://localhost:5432/helpdesk`     |
    /// | `DATABASE_MAX_CONNECTIONS`      | `5`                                      |
    /// | `DATABASE_ACQUIRE_TIMEOUT_SECS` | `30`                                     |
    /// | `PENDING_SESSION_TTL_SECS`      | `600`                                    |
    ///
    /// Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: secs("DATABASE_ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT),
            pending_ttl: secs("PENDING_SESSION_TTL_SECS", DEFAULT_PENDING_TTL),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}
