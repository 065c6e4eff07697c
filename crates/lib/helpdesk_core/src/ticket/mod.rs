//! Ticket workflow.
//!
//! A ticket is created with its opening message and labels in one
//! transaction, collects replies while open, and is closed exactly once.
//! Assignment of agents is gated by the predicates in [`crate::authz`]; see
//! [`queries::claim_ticket`], [`queries::delegate_ticket`] and
//! [`queries::unassign_ticket`].

pub mod inbox;
pub mod queries;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ticket::DueDate;

/// Identifiers produced by [`queries::create_ticket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub ticket_id: Uuid,
    /// The opening message.
    pub message_id: i64,
    pub due_date: DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateTicketResult {
    Success(NewTicket),
    /// The author is not a known user.
    NoAuthor,
    /// At least one label id does not exist. No ticket was created.
    NoLabels,
}

/// A reply as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reply {
    pub message_id: i64,
    pub creation: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateReplyResult {
    Success(Reply),
    /// The ticket is closed and takes no more replies.
    Closed,
    NoTicket,
    NoUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStatusResult {
    /// The ticket was closed.
    Success,
    /// The ticket already had the requested status.
    Unchanged,
    /// Closed tickets stay closed.
    Refused,
    NoTicket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTicketLabelResult {
    Success,
    AlreadyExists,
    NoTicket,
    NoLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignAgentToTicketResult {
    Success,
    AlreadyExists,
    NoTicket,
    /// The user is not an agent of the department.
    NoAgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTicketPriorityResult {
    Success,
    NoTicket,
    NoPriority,
}

/// Outcome of a permission-gated assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentDecision {
    /// The permission check passed and the insert was attempted.
    Assigned(AssignAgentToTicketResult),
    Denied,
    /// The ticket or department does not exist.
    Unknown,
    /// The acting user tried to delegate to themselves. Use a claim instead.
    SelfDelegation,
}

/// Outcome of a permission-gated unassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnassignmentDecision {
    /// The agent was removed; `head` is their head flag in the department.
    Removed { head: bool },
    /// The target was not assigned through this department.
    NotAssigned,
    /// The department is not engaged with the ticket.
    NotEngaged,
    Denied,
    /// The ticket or department does not exist.
    Unknown,
}
