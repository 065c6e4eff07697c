//! Label queries.
//!
//! Deadlines are `INTERVAL DAY` in storage and whole days at the API.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{Result, single_row};
use crate::models::check_len;
use crate::models::label::{Label, LabelRow, MAX_TITLE_LEN, check_deadline, color_to_storage};

/// Create a label, returning its id.
pub async fn create_label(
    pool: &PgPool,
    title: &str,
    color: u32,
    deadline: Option<i32>,
) -> Result<i32> {
    check_len("title", title, MAX_TITLE_LEN)?;
    check_deadline(deadline)?;
    let label_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO labels (title, color, deadline) \
         VALUES ($1, $2, $3::INT * INTERVAL '1 day') RETURNING label_id",
    )
    .bind(title)
    .bind(color_to_storage(color))
    .bind(deadline)
    .fetch_one(pool)
    .await?;
    debug!(label_id, "label created");
    Ok(label_id)
}

/// Returns `false` if not found.
pub async fn edit_label_title(pool: &PgPool, label_id: i32, title: &str) -> Result<bool> {
    check_len("title", title, MAX_TITLE_LEN)?;
    let result = sqlx::query("UPDATE labels SET title = $2 WHERE label_id = $1")
        .bind(label_id)
        .bind(title)
        .execute(pool)
        .await?;
    single_row(result.rows_affected())
}

/// Returns `false` if not found.
pub async fn edit_label_color(pool: &PgPool, label_id: i32, color: u32) -> Result<bool> {
    let result = sqlx::query("UPDATE labels SET color = $2 WHERE label_id = $1")
        .bind(label_id)
        .bind(color_to_storage(color))
        .execute(pool)
        .await?;
    single_row(result.rows_affected())
}

/// Set or clear (`None`) the deadline. Returns `false` if not found.
pub async fn edit_label_deadline(
    pool: &PgPool,
    label_id: i32,
    deadline: Option<i32>,
) -> Result<bool> {
    check_deadline(deadline)?;
    let result = sqlx::query(
        "UPDATE labels SET deadline = $2::INT * INTERVAL '1 day' WHERE label_id = $1",
    )
    .bind(label_id)
    .bind(deadline)
    .execute(pool)
    .await?;
    single_row(result.rows_affected())
}

pub async fn get_labels(pool: &PgPool) -> Result<Vec<Label>> {
    let rows = sqlx::query_as::<_, LabelRow>(
        "SELECT label_id, title, color, EXTRACT(DAY FROM deadline)::INT AS deadline \
         FROM labels ORDER BY label_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Label::from).collect())
}
