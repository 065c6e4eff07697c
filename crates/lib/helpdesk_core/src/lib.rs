//! # helpdesk_core
//!
//! Data layer for the Helpdesk ticketing system: sessions, departments, labels,
//! priorities, tickets, and the authorization rules that guard them.

pub mod authz;
pub mod config;
pub mod constraint;
pub mod db;
pub mod error;
pub mod local;
pub mod models;
pub mod registry;
pub mod session;
pub mod ticket;
pub mod uuid;

pub use config::StoreConfig;
pub use db::{Database, Transaction};
pub use error::{DataError, Result};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
