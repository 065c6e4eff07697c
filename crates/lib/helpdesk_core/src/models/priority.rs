//! Ticket priorities.

use serde::{Deserialize, Serialize};

/// Maximum length of a priority title.
pub const MAX_TITLE_LEN: usize = 32;

/// A named priority level. Whether lower or higher is more urgent is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Priority {
    pub priority_id: i32,
    pub title: String,
    pub priority: i32,
}
