//! User listings.

use sqlx::PgPool;

use crate::error::Result;
use crate::models::user::User;

pub async fn get_users(pool: &PgPool) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(
        "SELECT user_id, name, email, picture, admin FROM users ORDER BY name, user_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Users who are not agents of `dept_id`, for picking new agents.
pub async fn get_users_outside_dept(pool: &PgPool, dept_id: i32) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(
        "SELECT u.user_id, u.name, u.email, u.picture, u.admin FROM users u \
         WHERE NOT EXISTS \
             (SELECT 1 FROM dept_agents a WHERE a.user_id = u.user_id AND a.dept_id = $1) \
         ORDER BY u.name, u.user_id",
    )
    .bind(dept_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
