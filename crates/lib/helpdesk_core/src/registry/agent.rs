//! Department agent queries.

use std::sync::LazyLock;

use sqlx::PgPool;
use tracing::{info, warn};

use super::AddDeptAgentResult;
use crate::constraint::{ConstraintKey, ConstraintMap, StoreResultExt};
use crate::error::Result;
use crate::models::user::Agent;

static ADD_DEPT_AGENT: LazyLock<ConstraintMap<AddDeptAgentResult>> = LazyLock::new(|| {
    ConstraintMap::new()
        .referential(
            "dept_agents",
            "dept_agents_dept_id_fkey",
            AddDeptAgentResult::NoDept,
        )
        .referential(
            "dept_agents",
            "dept_agents_user_id_fkey",
            AddDeptAgentResult::NoUser,
        )
        .unique("dept_agents", "dept_agents_pkey", AddDeptAgentResult::AlreadyExists)
});

pub(crate) fn constraint_keys() -> Vec<ConstraintKey> {
    ADD_DEPT_AGENT.keys().collect()
}

/// Add `uid` to the department's staff, optionally as head.
pub async fn add_dept_agent(
    pool: &PgPool,
    dept_id: i32,
    uid: &str,
    head: bool,
) -> Result<AddDeptAgentResult> {
    let attempt =
        sqlx::query("INSERT INTO dept_agents (dept_id, user_id, head) VALUES ($1, $2, $3)")
            .bind(dept_id)
            .bind(uid)
            .bind(head)
            .execute(pool)
            .await
            .store_result()?;

    let result = ADD_DEPT_AGENT.resolve(attempt, |_| AddDeptAgentResult::Success)?;
    if result == AddDeptAgentResult::Success {
        info!(dept_id, user_id = uid, head, "agent added");
    }
    Ok(result)
}

/// Remove an agent. Returns the removed agent's head flag, or `None` if the
/// user was not an agent of the department.
///
/// Ticket assignments held through this department go with it.
pub async fn remove_dept_agent(pool: &PgPool, dept_id: i32, uid: &str) -> Result<Option<bool>> {
    let head = sqlx::query_scalar::<_, bool>(
        "DELETE FROM dept_agents WHERE dept_id = $1 AND user_id = $2 RETURNING head",
    )
    .bind(dept_id)
    .bind(uid)
    .fetch_optional(pool)
    .await?;
    if head.is_some() {
        info!(dept_id, user_id = uid, "agent removed");
    }
    Ok(head)
}

/// Set an agent's head flag, returning the previous value, or `None` if the
/// user is not an agent of the department.
pub async fn set_head_for_agent(
    pool: &PgPool,
    dept_id: i32,
    uid: &str,
    head: bool,
) -> Result<Option<bool>> {
    let previous = sqlx::query_scalar::<_, bool>(
        "UPDATE dept_agents a SET head = $3 \
         FROM (SELECT dept_id, user_id, head FROM dept_agents \
               WHERE dept_id = $1 AND user_id = $2 FOR UPDATE) old \
         WHERE a.dept_id = old.dept_id AND a.user_id = old.user_id \
         RETURNING old.head",
    )
    .bind(dept_id)
    .bind(uid)
    .bind(head)
    .fetch_optional(pool)
    .await?;

    if previous == Some(head) {
        warn!(dept_id, user_id = uid, head, "head flag already set");
    }
    Ok(previous)
}

/// Agents of `dept_id`, heads first.
pub async fn get_agents_by_dept(pool: &PgPool, dept_id: i32) -> Result<Vec<Agent>> {
    let rows = sqlx::query_as::<_, Agent>(
        "SELECT dept_id, user_id, head FROM dept_agents \
         WHERE dept_id = $1 ORDER BY head DESC, user_id",
    )
    .bind(dept_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
