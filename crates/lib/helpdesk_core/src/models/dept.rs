//! Departments.

use serde::{Deserialize, Serialize};

/// Maximum length of a department name.
pub const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dept {
    pub dept_id: i32,
    pub name: String,
}

/// A department's subscription to a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeptLabel {
    pub dept_id: i32,
    pub label_id: i32,
}
