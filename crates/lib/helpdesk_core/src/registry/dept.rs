//! Department queries.

use std::sync::LazyLock;

use sqlx::PgPool;
use tracing::debug;

use super::SubscribeDeptToLabelResult;
use crate::constraint::{ConstraintKey, ConstraintMap, StoreResultExt};
use crate::error::{Result, single_row};
use crate::models::check_len;
use crate::models::dept::{Dept, DeptLabel, MAX_NAME_LEN};

static SUBSCRIBE_DEPT_TO_LABEL: LazyLock<ConstraintMap<SubscribeDeptToLabelResult>> =
    LazyLock::new(|| {
        ConstraintMap::new()
            .referential(
                "dept_labels",
                "dept_labels_dept_id_fkey",
                SubscribeDeptToLabelResult::NoDept,
            )
            .referential(
                "dept_labels",
                "dept_labels_label_id_fkey",
                SubscribeDeptToLabelResult::NoLabel,
            )
            .unique(
                "dept_labels",
                "dept_labels_pkey",
                SubscribeDeptToLabelResult::AlreadyExists,
            )
    });

pub(crate) fn constraint_keys() -> Vec<ConstraintKey> {
    SUBSCRIBE_DEPT_TO_LABEL.keys().collect()
}

/// Create a department, returning its id.
pub async fn create_dept(pool: &PgPool, name: &str) -> Result<i32> {
    check_len("name", name, MAX_NAME_LEN)?;
    let dept_id =
        sqlx::query_scalar::<_, i32>("INSERT INTO depts (name) VALUES ($1) RETURNING dept_id")
            .bind(name)
            .fetch_one(pool)
            .await?;
    debug!(dept_id, "department created");
    Ok(dept_id)
}

/// Rename a department. Returns `false` if not found.
pub async fn edit_dept_name(pool: &PgPool, dept_id: i32, name: &str) -> Result<bool> {
    check_len("name", name, MAX_NAME_LEN)?;
    let result = sqlx::query("UPDATE depts SET name = $2 WHERE dept_id = $1")
        .bind(dept_id)
        .bind(name)
        .execute(pool)
        .await?;
    single_row(result.rows_affected())
}

/// Opt a department in to a label.
pub async fn subscribe_dept_to_label(
    pool: &PgPool,
    dept_id: i32,
    label_id: i32,
) -> Result<SubscribeDeptToLabelResult> {
    let attempt = sqlx::query("INSERT INTO dept_labels (dept_id, label_id) VALUES ($1, $2)")
        .bind(dept_id)
        .bind(label_id)
        .execute(pool)
        .await
        .store_result()?;
    SUBSCRIBE_DEPT_TO_LABEL.resolve(attempt, |_| SubscribeDeptToLabelResult::Success)
}

pub async fn get_departments(pool: &PgPool) -> Result<Vec<Dept>> {
    let rows = sqlx::query_as::<_, Dept>("SELECT dept_id, name FROM depts ORDER BY dept_id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_dept_labels(pool: &PgPool) -> Result<Vec<DeptLabel>> {
    let rows = sqlx::query_as::<_, DeptLabel>(
        "SELECT dept_id, label_id FROM dept_labels ORDER BY dept_id, label_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
