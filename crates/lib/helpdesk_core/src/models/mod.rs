//! Domain models.
//!
//! Row types map one-to-one onto the schema in `migrations/`. Length limits
//! mirror the column widths and are checked before a statement runs.

pub mod dept;
pub mod label;
pub mod priority;
pub mod session;
pub mod ticket;
pub mod user;

use crate::error::{DataError, Result};

/// Rejects `value` if it exceeds `max` characters.
pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DataError::ValidationError(format!(
            "{field} is {len} characters long, maximum is {max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_not_bytes() {
        assert!(check_len("name", "ééééé", 5).is_ok());
        assert!(check_len("name", "ééééé", 4).is_err());
    }

    #[test]
    fn names_the_field() {
        let err = check_len("title", "abcdef", 3).unwrap_err();
        assert!(err.to_string().contains("title"));
    }
}
