// Ticket identifiers are UUIDv7 so that tickets sort by creation time
// without a separate timestamp column. PostgreSQL has no native v7
// generator, so the id is produced app-side before the insert.

use uuid::Uuid;

/// Generate a new ticket id.
pub fn ticket_id() -> Uuid {
    Uuid::now_v7()
}
