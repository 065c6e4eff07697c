//! Entity registry: departments, labels, priorities, users, and agents.
//!
//! Creates return the generated id (never 0). Field edits return `true` if
//! the row was found and `false` otherwise.

pub mod agent;
pub mod dept;
pub mod label;
pub mod priority;
pub mod user;

use crate::constraint::ConstraintKey;

/// Outcome of [`agent::add_dept_agent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddDeptAgentResult {
    /// Agent added.
    Success,
    /// The user is already an agent of the department. Nothing changed.
    AlreadyExists,
    NoDept,
    NoUser,
}

/// Outcome of [`dept::subscribe_dept_to_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeDeptToLabelResult {
    /// Subscription added.
    Success,
    /// Already subscribed. Nothing changed.
    AlreadyExists,
    NoDept,
    NoLabel,
}

pub(crate) fn constraint_keys() -> Vec<ConstraintKey> {
    agent::constraint_keys()
        .into_iter()
        .chain(dept::constraint_keys())
        .collect()
}
