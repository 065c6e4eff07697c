//! Tickets, their labels, assignments, and message threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a ticket title.
pub const MAX_TITLE_LEN: usize = 128;
/// Maximum length of a message body.
pub const MAX_BODY_LEN: usize = 1024;

/// When a ticket is due.
///
/// Stored as `TIMESTAMPTZ` where `Never` is PostgreSQL's `infinity`. Variant
/// order makes `Never` compare greater than every finite date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DueDate {
    At(DateTime<Utc>),
    Never,
}

impl From<Option<DateTime<Utc>>> for DueDate {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Never, Self::At)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: Uuid,
    pub title: String,
    pub open: bool,
    pub due_date: DueDate,
    pub priority_id: Option<i32>,
}

/// Columns selecting a [`TicketRow`] from `tickets`, with `infinity` mapped to NULL.
pub(crate) const TICKET_COLUMNS: &str = "ticket_id, title, open, \
     CASE WHEN isfinite(due_date) THEN due_date END AS due_date, priority_id";

/// A ticket as read from storage.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TicketRow {
    pub ticket_id: Uuid,
    pub title: String,
    pub open: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub priority_id: Option<i32>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            ticket_id: row.ticket_id,
            title: row.title,
            open: row.open,
            due_date: row.due_date.into(),
            priority_id: row.priority_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketLabel {
    pub ticket_id: Uuid,
    pub label_id: i32,
}

/// An agent working a ticket on behalf of a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub ticket_id: Uuid,
    pub dept_id: i32,
    pub user_id: String,
}

/// One entry in a ticket's thread. The first message is the ticket body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub ticket_id: Uuid,
    pub author_id: String,
    pub message_id: i64,
    pub creation: DateTime<Utc>,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn never_sorts_last() {
        let far = Utc.with_ymd_and_hms(200_000, 1, 1, 0, 0, 0).unwrap();
        assert!(DueDate::Never > DueDate::At(far));
        assert!(DueDate::At(Utc::now()) < DueDate::Never);

        let mut dates = vec![DueDate::Never, DueDate::At(far), DueDate::At(Utc::now())];
        dates.sort();
        assert_eq!(dates.last(), Some(&DueDate::Never));
    }

    #[test]
    fn null_is_never() {
        assert_eq!(DueDate::from(None), DueDate::Never);
        let now = Utc::now();
        assert_eq!(DueDate::from(Some(now)), DueDate::At(now));
    }
}
