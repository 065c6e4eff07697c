//! Predicate queries.
//!
//! Each predicate is one statement whose result is `NULL` when the ticket or
//! department is missing, so existence and permission are read from the same
//! snapshot.

use sqlx::PgPool;
use uuid::Uuid;

use super::Permission;
use crate::error::Result;

async fn predicate(
    pool: &PgPool,
    sql: &'static str,
    ticket_id: Uuid,
    dept_id: Option<i32>,
    user_id: Option<&str>,
) -> Result<Permission> {
    let mut query = sqlx::query_scalar::<_, Option<bool>>(sql).bind(ticket_id);
    if let Some(dept_id) = dept_id {
        query = query.bind(dept_id);
    }
    if let Some(user_id) = user_id {
        query = query.bind(user_id);
    }
    let answer = query.fetch_one(pool).await?;
    Ok(answer.into())
}

/// Whether `uid` wrote the ticket's opening message.
pub async fn is_ticket_author(pool: &PgPool, ticket_id: Uuid, uid: &str) -> Result<Permission> {
    predicate(
        pool,
        "SELECT (SELECT author_id FROM messages WHERE ticket_id = $1 \
                 ORDER BY message_id LIMIT 1) = $2",
        ticket_id,
        None,
        Some(uid),
    )
    .await
}

/// Whether `uid` is assigned to the ticket through any department.
pub async fn is_assigned_agent(pool: &PgPool, ticket_id: Uuid, uid: &str) -> Result<Permission> {
    predicate(
        pool,
        "SELECT CASE WHEN EXISTS (SELECT 1 FROM tickets WHERE ticket_id = $1) \
             THEN EXISTS (SELECT 1 FROM assignments WHERE ticket_id = $1 AND user_id = $2) \
         END",
        ticket_id,
        None,
        Some(uid),
    )
    .await
}

/// Whether any agent of `dept_id` is assigned to the ticket.
pub async fn is_assigned_dept(pool: &PgPool, ticket_id: Uuid, dept_id: i32) -> Result<Permission> {
    predicate(
        pool,
        "SELECT CASE WHEN EXISTS (SELECT 1 FROM tickets WHERE ticket_id = $1) \
                  AND EXISTS (SELECT 1 FROM depts WHERE dept_id = $2) \
             THEN EXISTS (SELECT 1 FROM assignments WHERE ticket_id = $1 AND dept_id = $2) \
         END",
        ticket_id,
        Some(dept_id),
        None,
    )
    .await
}

/// Author or assigned agent.
pub async fn can_edit_ticket(pool: &PgPool, ticket_id: Uuid, uid: &str) -> Result<Permission> {
    predicate(
        pool,
        "SELECT CASE WHEN EXISTS (SELECT 1 FROM tickets WHERE ticket_id = $1) \
             THEN coalesce((SELECT author_id FROM messages WHERE ticket_id = $1 \
                            ORDER BY message_id LIMIT 1) = $2, FALSE) \
               OR EXISTS (SELECT 1 FROM assignments WHERE ticket_id = $1 AND user_id = $2) \
         END",
        ticket_id,
        None,
        Some(uid),
    )
    .await
}

/// Whether `uid` may claim the ticket for `dept_id`: they must be an agent of
/// the department, and the department must already be engaged with the
/// ticket.
pub async fn can_assign_self_to_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    uid: &str,
) -> Result<Permission> {
    predicate(
        pool,
        "SELECT CASE WHEN EXISTS (SELECT 1 FROM tickets WHERE ticket_id = $1) \
                  AND EXISTS (SELECT 1 FROM depts WHERE dept_id = $2) \
             THEN EXISTS (SELECT 1 FROM dept_agents WHERE dept_id = $2 AND user_id = $3) \
              AND EXISTS (SELECT 1 FROM assignments WHERE ticket_id = $1 AND dept_id = $2) \
         END",
        ticket_id,
        Some(dept_id),
        Some(uid),
    )
    .await
}

/// Whether `actor` may assign other agents of `dept_id` to the ticket: heads
/// of the department and agents already working the ticket may.
pub async fn can_assign_others_to_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    actor: &str,
) -> Result<Permission> {
    predicate(
        pool,
        "SELECT CASE WHEN EXISTS (SELECT 1 FROM tickets WHERE ticket_id = $1) \
                  AND EXISTS (SELECT 1 FROM depts WHERE dept_id = $2) \
             THEN EXISTS (SELECT 1 FROM dept_agents \
                          WHERE dept_id = $2 AND user_id = $3 AND head) \
               OR EXISTS (SELECT 1 FROM assignments WHERE ticket_id = $1 AND user_id = $3) \
         END",
        ticket_id,
        Some(dept_id),
        Some(actor),
    )
    .await
}
