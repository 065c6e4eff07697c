//! Ticket mutations.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    AssignAgentToTicketResult, AssignTicketLabelResult, AssignTicketPriorityResult,
    AssignmentDecision, CreateReplyResult, CreateTicketResult, NewTicket, Reply, SetStatusResult,
    UnassignmentDecision,
};
use crate::authz::Permission;
use crate::authz::queries::{
    can_assign_others_to_ticket, can_assign_self_to_ticket, is_assigned_dept,
};
use crate::constraint::{ConstraintKey, ConstraintMap, StoreResultExt};
use crate::error::{Result, single_row};
use crate::models::check_len;
use crate::models::ticket::{MAX_BODY_LEN, MAX_TITLE_LEN};

static CREATE_TICKET: LazyLock<ConstraintMap<CreateTicketResult>> = LazyLock::new(|| {
    ConstraintMap::new()
        .referential(
            "messages",
            "messages_author_id_fkey",
            CreateTicketResult::NoAuthor,
        )
        .referential(
            "ticket_labels",
            "ticket_labels_label_id_fkey",
            CreateTicketResult::NoLabels,
        )
});

static CREATE_REPLY: LazyLock<ConstraintMap<CreateReplyResult>> = LazyLock::new(|| {
    ConstraintMap::new().referential(
        "messages",
        "messages_author_id_fkey",
        CreateReplyResult::NoUser,
    )
});

static ASSIGN_TICKET_LABEL: LazyLock<ConstraintMap<AssignTicketLabelResult>> =
    LazyLock::new(|| {
        ConstraintMap::new()
            .referential(
                "ticket_labels",
                "ticket_labels_ticket_id_fkey",
                AssignTicketLabelResult::NoTicket,
            )
            .referential(
                "ticket_labels",
                "ticket_labels_label_id_fkey",
                AssignTicketLabelResult::NoLabel,
            )
            .unique(
                "ticket_labels",
                "ticket_labels_pkey",
                AssignTicketLabelResult::AlreadyExists,
            )
    });

static ASSIGN_AGENT_TO_TICKET: LazyLock<ConstraintMap<AssignAgentToTicketResult>> =
    LazyLock::new(|| {
        ConstraintMap::new()
            .referential(
                "assignments",
                "assignments_ticket_id_fkey",
                AssignAgentToTicketResult::NoTicket,
            )
            .referential(
                "assignments",
                "assignments_dept_id_user_id_fkey",
                AssignAgentToTicketResult::NoAgent,
            )
            .unique(
                "assignments",
                "assignments_pkey",
                AssignAgentToTicketResult::AlreadyExists,
            )
    });

static ASSIGN_TICKET_PRIORITY: LazyLock<ConstraintMap<AssignTicketPriorityResult>> =
    LazyLock::new(|| {
        ConstraintMap::new().referential(
            "tickets",
            "tickets_priority_id_fkey",
            AssignTicketPriorityResult::NoPriority,
        )
    });

pub(crate) fn constraint_keys() -> Vec<ConstraintKey> {
    CREATE_TICKET
        .keys()
        .chain(CREATE_REPLY.keys())
        .chain(ASSIGN_TICKET_LABEL.keys())
        .chain(ASSIGN_AGENT_TO_TICKET.keys())
        .chain(ASSIGN_TICKET_PRIORITY.keys())
        .collect()
}

/// Open a ticket with its first message and labels.
///
/// Either everything is stored or nothing is. Repeated label ids count once.
pub async fn create_ticket(
    pool: &PgPool,
    title: &str,
    author: &str,
    body: &str,
    labels: &[i32],
) -> Result<CreateTicketResult> {
    check_len("title", title, MAX_TITLE_LEN)?;
    check_len("body", body, MAX_BODY_LEN)?;

    let mut labels = labels.to_vec();
    labels.sort_unstable();
    labels.dedup();

    let ticket_id = crate::uuid::ticket_id();
    let mut tx = pool.begin().await?;

    let due_date = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "INSERT INTO tickets (ticket_id, title) VALUES ($1, $2) \
         RETURNING CASE WHEN isfinite(due_date) THEN due_date END",
    )
    .bind(ticket_id)
    .bind(title)
    .fetch_one(&mut *tx)
    .await?;

    // The opening message goes in before the labels so a bad author is
    // reported ahead of a bad label.
    let attempt = sqlx::query_scalar::<_, i64>(
        "INSERT INTO messages (ticket_id, author_id, body) VALUES ($1, $2, $3) \
         RETURNING message_id",
    )
    .bind(ticket_id)
    .bind(author)
    .bind(body)
    .fetch_one(&mut *tx)
    .await
    .store_result()?;
    let message_id = match attempt {
        Ok(id) => id,
        Err(failure) => {
            tx.rollback().await?;
            return CREATE_TICKET.translate(&failure);
        }
    };

    let attempt = sqlx::query(
        "INSERT INTO ticket_labels (ticket_id, label_id) SELECT $1, unnest($2::INT[])",
    )
    .bind(ticket_id)
    .bind(labels.as_slice())
    .execute(&mut *tx)
    .await
    .store_result()?;
    if let Err(failure) = attempt {
        tx.rollback().await?;
        return CREATE_TICKET.translate(&failure);
    }

    tx.commit().await?;
    debug!(%ticket_id, message_id, labels = labels.len(), "ticket created");
    Ok(CreateTicketResult::Success(NewTicket {
        ticket_id,
        message_id,
        due_date: due_date.into(),
    }))
}

/// Append a message to an open ticket's thread.
///
/// The ticket row is share-locked for the insert, so a concurrent close
/// either lands before (and the reply is `Closed`) or waits.
pub async fn create_reply(
    pool: &PgPool,
    ticket_id: Uuid,
    author: &str,
    body: &str,
) -> Result<CreateReplyResult> {
    check_len("body", body, MAX_BODY_LEN)?;
    let mut tx = pool.begin().await?;

    let open =
        sqlx::query_scalar::<_, bool>("SELECT open FROM tickets WHERE ticket_id = $1 FOR SHARE")
            .bind(ticket_id)
            .fetch_optional(&mut *tx)
            .await?;
    match open {
        None => return Ok(CreateReplyResult::NoTicket),
        Some(false) => return Ok(CreateReplyResult::Closed),
        Some(true) => {}
    }

    let attempt = sqlx::query_as::<_, Reply>(
        "INSERT INTO messages (ticket_id, author_id, body) VALUES ($1, $2, $3) \
         RETURNING message_id, creation",
    )
    .bind(ticket_id)
    .bind(author)
    .bind(body)
    .fetch_one(&mut *tx)
    .await
    .store_result()?;

    let result = CREATE_REPLY.resolve(attempt, CreateReplyResult::Success)?;
    match result {
        CreateReplyResult::Success(_) => tx.commit().await?,
        _ => tx.rollback().await?,
    }
    Ok(result)
}

/// Set a ticket's open flag. Closing is one-way.
pub async fn set_status_for_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    open: bool,
) -> Result<SetStatusResult> {
    let mut tx = pool.begin().await?;
    let current =
        sqlx::query_scalar::<_, bool>("SELECT open FROM tickets WHERE ticket_id = $1 FOR UPDATE")
            .bind(ticket_id)
            .fetch_optional(&mut *tx)
            .await?;

    let result = match current {
        None => SetStatusResult::NoTicket,
        Some(current) if current == open => SetStatusResult::Unchanged,
        Some(false) => {
            warn!(%ticket_id, "refused to reopen closed ticket");
            SetStatusResult::Refused
        }
        Some(true) => {
            let result = sqlx::query("UPDATE tickets SET open = FALSE WHERE ticket_id = $1")
                .bind(ticket_id)
                .execute(&mut *tx)
                .await?;
            single_row(result.rows_affected())?;
            info!(%ticket_id, "ticket closed");
            SetStatusResult::Success
        }
    };
    tx.commit().await?;
    Ok(result)
}

/// Returns `false` if not found.
pub async fn edit_ticket_title(pool: &PgPool, ticket_id: Uuid, title: &str) -> Result<bool> {
    check_len("title", title, MAX_TITLE_LEN)?;
    let result = sqlx::query("UPDATE tickets SET title = $2 WHERE ticket_id = $1")
        .bind(ticket_id)
        .bind(title)
        .execute(pool)
        .await?;
    single_row(result.rows_affected())
}

/// Set the due date, or reset it to never with `None`.
///
/// Returns `Some(true)` on success, `Some(false)` if `due` is not in the
/// future, and `None` if the ticket does not exist.
pub async fn edit_ticket_due_date(
    pool: &PgPool,
    ticket_id: Uuid,
    due: Option<DateTime<Utc>>,
) -> Result<Option<bool>> {
    let (found, changed) = sqlx::query_as::<_, (bool, bool)>(
        "WITH target AS (SELECT ticket_id FROM tickets WHERE ticket_id = $1), \
         updated AS ( \
             UPDATE tickets t \
             SET due_date = coalesce($2::TIMESTAMPTZ, 'infinity'::TIMESTAMPTZ) \
             FROM target WHERE t.ticket_id = target.ticket_id \
               AND ($2::TIMESTAMPTZ IS NULL OR $2::TIMESTAMPTZ > now()) \
             RETURNING t.ticket_id) \
         SELECT EXISTS (SELECT 1 FROM target), EXISTS (SELECT 1 FROM updated)",
    )
    .bind(ticket_id)
    .bind(due)
    .fetch_one(pool)
    .await?;

    Ok(found.then_some(changed))
}

pub async fn assign_ticket_label(
    pool: &PgPool,
    ticket_id: Uuid,
    label_id: i32,
) -> Result<AssignTicketLabelResult> {
    let attempt = sqlx::query("INSERT INTO ticket_labels (ticket_id, label_id) VALUES ($1, $2)")
        .bind(ticket_id)
        .bind(label_id)
        .execute(pool)
        .await
        .store_result()?;
    ASSIGN_TICKET_LABEL.resolve(attempt, |_| AssignTicketLabelResult::Success)
}

/// Assign an agent of `dept_id` to the ticket, unconditionally.
///
/// Route handlers go through [`claim_ticket`] or [`delegate_ticket`], which
/// check permissions first.
pub async fn assign_agent_to_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    uid: &str,
) -> Result<AssignAgentToTicketResult> {
    let attempt = sqlx::query(
        "INSERT INTO assignments (ticket_id, dept_id, user_id) VALUES ($1, $2, $3)",
    )
    .bind(ticket_id)
    .bind(dept_id)
    .bind(uid)
    .execute(pool)
    .await
    .store_result()?;

    let result =
        ASSIGN_AGENT_TO_TICKET.resolve(attempt, |_| AssignAgentToTicketResult::Success)?;
    if result == AssignAgentToTicketResult::Success {
        info!(%ticket_id, dept_id, user_id = uid, "agent assigned");
    }
    Ok(result)
}

/// Set the ticket's priority.
///
/// A missing ticket is detected by the row count before the priority's
/// foreign key is checked, so `NoTicket` takes precedence over `NoPriority`.
pub async fn assign_ticket_priority(
    pool: &PgPool,
    ticket_id: Uuid,
    priority_id: i32,
) -> Result<AssignTicketPriorityResult> {
    let attempt = sqlx::query("UPDATE tickets SET priority_id = $2 WHERE ticket_id = $1")
        .bind(ticket_id)
        .bind(priority_id)
        .execute(pool)
        .await
        .store_result()?;

    match attempt {
        Ok(result) => Ok(if single_row(result.rows_affected())? {
            AssignTicketPriorityResult::Success
        } else {
            AssignTicketPriorityResult::NoTicket
        }),
        Err(failure) => ASSIGN_TICKET_PRIORITY.translate(&failure),
    }
}

/// Unassign an agent. Returns whether the removed agent is a head of the
/// department, or `None` if they were not assigned.
pub async fn remove_ticket_agent(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    uid: &str,
) -> Result<Option<bool>> {
    let head = sqlx::query_scalar::<_, bool>(
        "DELETE FROM assignments a USING dept_agents d \
         WHERE a.ticket_id = $1 AND a.dept_id = $2 AND a.user_id = $3 \
           AND d.dept_id = a.dept_id AND d.user_id = a.user_id \
         RETURNING d.head",
    )
    .bind(ticket_id)
    .bind(dept_id)
    .bind(uid)
    .fetch_optional(pool)
    .await?;
    if head.is_some() {
        info!(%ticket_id, dept_id, user_id = uid, "agent unassigned");
    }
    Ok(head)
}

/// An agent assigns themselves to a ticket their department is engaged with.
pub async fn claim_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    uid: &str,
) -> Result<AssignmentDecision> {
    match can_assign_self_to_ticket(pool, ticket_id, dept_id, uid).await? {
        Permission::Unknown => Ok(AssignmentDecision::Unknown),
        Permission::Denied => Ok(AssignmentDecision::Denied),
        Permission::Allowed => {
            let result = assign_agent_to_ticket(pool, ticket_id, dept_id, uid).await?;
            Ok(AssignmentDecision::Assigned(result))
        }
    }
}

/// `actor` assigns `target`, an agent of `dept_id`, to the ticket.
///
/// `actor` must be a head of the department or already working the ticket,
/// and `target` must be able to claim it, so the department has to be
/// engaged already. Engaging a department is [`assign_agent_to_ticket`].
pub async fn delegate_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    actor: &str,
    target: &str,
) -> Result<AssignmentDecision> {
    if actor == target {
        return Ok(AssignmentDecision::SelfDelegation);
    }
    match can_assign_others_to_ticket(pool, ticket_id, dept_id, actor).await? {
        Permission::Unknown => return Ok(AssignmentDecision::Unknown),
        Permission::Denied => return Ok(AssignmentDecision::Denied),
        Permission::Allowed => {}
    }
    match can_assign_self_to_ticket(pool, ticket_id, dept_id, target).await? {
        Permission::Unknown => Ok(AssignmentDecision::Unknown),
        Permission::Denied => Ok(AssignmentDecision::Denied),
        Permission::Allowed => {
            let result = assign_agent_to_ticket(pool, ticket_id, dept_id, target).await?;
            Ok(AssignmentDecision::Assigned(result))
        }
    }
}

/// `actor` removes `target` from the ticket's assignments through `dept_id`.
///
/// The department must be engaged with the ticket and `actor` must be allowed
/// to assign others to it.
pub async fn unassign_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
    dept_id: i32,
    actor: &str,
    target: &str,
) -> Result<UnassignmentDecision> {
    match is_assigned_dept(pool, ticket_id, dept_id).await? {
        Permission::Unknown => return Ok(UnassignmentDecision::Unknown),
        Permission::Denied => return Ok(UnassignmentDecision::NotEngaged),
        Permission::Allowed => {}
    }
    match can_assign_others_to_ticket(pool, ticket_id, dept_id, actor).await? {
        Permission::Unknown => Ok(UnassignmentDecision::Unknown),
        Permission::Denied => Ok(UnassignmentDecision::Denied),
        Permission::Allowed => Ok(
            match remove_ticket_agent(pool, ticket_id, dept_id, target).await? {
                Some(head) => UnassignmentDecision::Removed { head },
                None => UnassignmentDecision::NotAssigned,
            },
        ),
    }
}
