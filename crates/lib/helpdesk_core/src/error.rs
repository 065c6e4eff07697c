//! Error types shared by every query module.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the data layer.
///
/// Expected domain outcomes (not found, already exists, missing reference) are
/// never errors; they are returned as values. The variants here are either
/// storage faults or fatal invariant violations (see [`DataError::is_fatal`]).
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("unexpected row count {0}")]
    UnexpectedRowCount(u64),

    #[error("unexpected constraint {constraint} on table {table} (code {code})")]
    UnexpectedConstraint {
        code: String,
        table: String,
        constraint: String,
    },

    #[error("constraint {constraint} on table {table} is missing from the schema")]
    MissingConstraint {
        table: &'static str,
        constraint: &'static str,
    },

    #[error("PostgreSQL command failed: {0}")]
    Command(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data directory not available")]
    NoDataDir,

    #[error("pg_config not found on PATH")]
    PgConfigNotFound,

    #[error("PostgreSQL not ready after {0:?}")]
    ReadyTimeout(Duration),
}

impl DataError {
    /// Whether this error signals a broken invariant rather than a runtime fault.
    ///
    /// Fatal errors must never be mapped to a client-facing "not found" or
    /// "conflict"; the route layer reports them as internal errors.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedRowCount(_)
                | Self::UnexpectedConstraint { .. }
                | Self::MissingConstraint { .. }
        )
    }
}

/// Result type for data-layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Interprets the row count of an update keyed by primary key.
///
/// Zero rows means the entity does not exist, one row means success.
/// Anything else is impossible under a primary-key predicate.
pub(crate) fn single_row(count: u64) -> Result<bool> {
    match count {
        0 => Ok(false),
        1 => Ok(true),
        n => Err(DataError::UnexpectedRowCount(n)),
    }
}
