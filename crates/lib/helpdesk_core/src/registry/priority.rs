//! Priority queries.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{Result, single_row};
use crate::models::check_len;
use crate::models::priority::{MAX_TITLE_LEN, Priority};

/// Create a priority, returning its id.
pub async fn create_priority(pool: &PgPool, title: &str, priority: i32) -> Result<i32> {
    check_len("title", title, MAX_TITLE_LEN)?;
    let priority_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO priorities (title, priority) VALUES ($1, $2) RETURNING priority_id",
    )
    .bind(title)
    .bind(priority)
    .fetch_one(pool)
    .await?;
    debug!(priority_id, "priority created");
    Ok(priority_id)
}

/// Returns `false` if not found.
pub async fn edit_priority_title(pool: &PgPool, priority_id: i32, title: &str) -> Result<bool> {
    check_len("title", title, MAX_TITLE_LEN)?;
    let result = sqlx::query("UPDATE priorities SET title = $2 WHERE priority_id = $1")
        .bind(priority_id)
        .bind(title)
        .execute(pool)
        .await?;
    single_row(result.rows_affected())
}

/// Returns `false` if not found.
pub async fn edit_priority_level(pool: &PgPool, priority_id: i32, priority: i32) -> Result<bool> {
    let result = sqlx::query("UPDATE priorities SET priority = $2 WHERE priority_id = $1")
        .bind(priority_id)
        .bind(priority)
        .execute(pool)
        .await?;
    single_row(result.rows_affected())
}

pub async fn get_priorities(pool: &PgPool) -> Result<Vec<Priority>> {
    let rows = sqlx::query_as::<_, Priority>(
        "SELECT priority_id, title, priority FROM priorities ORDER BY priority_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
