//! Labels.
//!
//! Colors are 32-bit RGBA values on the caller side and `INTEGER` (signed) in
//! storage. The two are converted by reinterpreting the bits, never by
//! clamping, so `0xc0debeef` survives the round trip.

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Maximum length of a label title.
pub const MAX_TITLE_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub label_id: i32,
    pub title: String,
    pub color: u32,
    /// Days until a labelled ticket is overdue; `None` means no deadline.
    pub deadline: Option<i32>,
}

/// A label as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LabelRow {
    pub label_id: i32,
    pub title: String,
    pub color: i32,
    pub deadline: Option<i32>,
}

impl From<LabelRow> for Label {
    fn from(row: LabelRow) -> Self {
        Self {
            label_id: row.label_id,
            title: row.title,
            color: color_from_storage(row.color),
            deadline: row.deadline,
        }
    }
}

/// Reinterprets a caller color as the stored signed integer.
pub fn color_to_storage(color: u32) -> i32 {
    i32::from_ne_bytes(color.to_ne_bytes())
}

/// Reinterprets a stored signed integer as the caller color.
pub fn color_from_storage(raw: i32) -> u32 {
    u32::from_ne_bytes(raw.to_ne_bytes())
}

/// Deadlines are positive day counts.
pub(crate) fn check_deadline(days: Option<i32>) -> Result<()> {
    match days {
        Some(d) if d <= 0 => Err(DataError::ValidationError(format!(
            "deadline must be a positive number of days, got {d}"
        ))),
        _ => Ok(()),
    }
}
