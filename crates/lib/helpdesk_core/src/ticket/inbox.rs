//! Ticket read side: listings, thread views, and inboxes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::label::{Label, LabelRow};
use crate::models::ticket::{Assignment, Message, TICKET_COLUMNS, Ticket, TicketLabel, TicketRow};

/// A ticket with its author and priority, for a ticket page header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInfo {
    pub ticket: Ticket,
    pub author_id: String,
    pub author_name: String,
    /// When the opening message was posted.
    pub creation: DateTime<Utc>,
    pub priority_title: Option<String>,
    pub priority: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct TicketInfoRow {
    #[sqlx(flatten)]
    ticket: TicketRow,
    author_id: String,
    author_name: String,
    creation: DateTime<Utc>,
    priority_title: Option<String>,
    priority: Option<i32>,
}

/// One message of a thread with its author's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThreadMessage {
    pub message_id: i64,
    pub author_id: String,
    pub author_name: String,
    pub picture: String,
    pub creation: DateTime<Utc>,
    pub body: String,
}

/// An agent working a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignedAgent {
    pub dept_id: i32,
    pub dept_name: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub head: bool,
}

fn tickets(rows: Vec<TicketRow>) -> Vec<Ticket> {
    rows.into_iter().map(Ticket::from).collect()
}

pub async fn get_tickets(pool: &PgPool) -> Result<Vec<Ticket>> {
    let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY ticket_id");
    let rows = sqlx::query_as::<_, TicketRow>(&sql).fetch_all(pool).await?;
    Ok(tickets(rows))
}

/// `None` if the ticket does not exist.
pub async fn get_ticket_info(pool: &PgPool, ticket_id: Uuid) -> Result<Option<TicketInfo>> {
    let row = sqlx::query_as::<_, TicketInfoRow>(
        "SELECT t.ticket_id, t.title, t.open, \
                CASE WHEN isfinite(t.due_date) THEN t.due_date END AS due_date, t.priority_id, \
                m.author_id, u.name AS author_name, m.creation, \
                p.title AS priority_title, p.priority \
         FROM tickets t \
         JOIN LATERAL (SELECT author_id, creation FROM messages \
                       WHERE ticket_id = t.ticket_id ORDER BY message_id LIMIT 1) m ON TRUE \
         JOIN users u ON u.user_id = m.author_id \
         LEFT JOIN priorities p ON p.priority_id = t.priority_id \
         WHERE t.ticket_id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| TicketInfo {
        ticket: row.ticket.into(),
        author_id: row.author_id,
        author_name: row.author_name,
        creation: row.creation,
        priority_title: row.priority_title,
        priority: row.priority,
    }))
}

/// The ticket's messages, oldest first.
pub async fn get_ticket_thread(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<ThreadMessage>> {
    let rows = sqlx::query_as::<_, ThreadMessage>(
        "SELECT m.message_id, m.author_id, u.name AS author_name, u.picture, m.creation, m.body \
         FROM messages m JOIN users u ON u.user_id = m.author_id \
         WHERE m.ticket_id = $1 ORDER BY m.message_id",
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_ticket_labels(pool: &PgPool) -> Result<Vec<TicketLabel>> {
    let rows = sqlx::query_as::<_, TicketLabel>(
        "SELECT ticket_id, label_id FROM ticket_labels ORDER BY ticket_id, label_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// The labels attached to one ticket.
pub async fn resolve_ticket_labels(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<Label>> {
    let rows = sqlx::query_as::<_, LabelRow>(
        "SELECT l.label_id, l.title, l.color, EXTRACT(DAY FROM l.deadline)::INT AS deadline \
         FROM ticket_labels tl JOIN labels l ON l.label_id = tl.label_id \
         WHERE tl.ticket_id = $1 ORDER BY l.label_id",
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Label::from).collect())
}

pub async fn get_assigned_agents_to_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
) -> Result<Vec<AssignedAgent>> {
    let rows = sqlx::query_as::<_, AssignedAgent>(
        "SELECT a.dept_id, d.name AS dept_name, a.user_id, u.name, u.email, da.head \
         FROM assignments a \
         JOIN depts d ON d.dept_id = a.dept_id \
         JOIN users u ON u.user_id = a.user_id \
         JOIN dept_agents da ON da.dept_id = a.dept_id AND da.user_id = a.user_id \
         WHERE a.ticket_id = $1 ORDER BY a.dept_id, u.name",
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every assignment row.
pub async fn get_assignments(pool: &PgPool) -> Result<Vec<Assignment>> {
    let rows = sqlx::query_as::<_, Assignment>(
        "SELECT ticket_id, dept_id, user_id FROM assignments ORDER BY ticket_id, dept_id, user_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_messages(pool: &PgPool) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        "SELECT ticket_id, author_id, message_id, creation, body FROM messages \
         ORDER BY message_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Tickets `uid` opened, soonest due first.
pub async fn get_user_inbox(pool: &PgPool, uid: &str) -> Result<Vec<Ticket>> {
    let sql = format!(
        "SELECT {TICKET_COLUMNS} FROM tickets t \
         WHERE (SELECT author_id FROM messages m WHERE m.ticket_id = t.ticket_id \
                ORDER BY message_id LIMIT 1) = $1 \
         ORDER BY t.due_date, t.ticket_id"
    );
    let rows = sqlx::query_as::<_, TicketRow>(&sql)
        .bind(uid)
        .fetch_all(pool)
        .await?;
    Ok(tickets(rows))
}

/// Tickets `uid` is assigned to in any department, soonest due first.
pub async fn get_agent_inbox(pool: &PgPool, uid: &str) -> Result<Vec<Ticket>> {
    let sql = format!(
        "SELECT {TICKET_COLUMNS} FROM tickets t \
         WHERE EXISTS (SELECT 1 FROM assignments a \
                       WHERE a.ticket_id = t.ticket_id AND a.user_id = $1) \
         ORDER BY t.due_date, t.ticket_id"
    );
    let rows = sqlx::query_as::<_, TicketRow>(&sql)
        .bind(uid)
        .fetch_all(pool)
        .await?;
    Ok(tickets(rows))
}
