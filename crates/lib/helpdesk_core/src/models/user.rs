//! Users and agents.

use serde::{Deserialize, Serialize};

use super::check_len;
use crate::error::Result;

/// Maximum length of an identity-provider subject id.
pub const MAX_USER_ID_LEN: usize = 255;
/// Maximum length of a display name.
pub const MAX_NAME_LEN: usize = 64;
/// Maximum length of an email address.
pub const MAX_EMAIL_LEN: usize = 40;

/// A user, keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub admin: bool,
}

/// Profile fields refreshed on every login. `admin` is never touched by an
/// upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl Profile {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.is_empty() {
            return Err(crate::DataError::ValidationError(
                "user_id must not be empty".into(),
            ));
        }
        check_len("user_id", &self.user_id, MAX_USER_ID_LEN)?;
        check_len("name", &self.name, MAX_NAME_LEN)?;
        check_len("email", &self.email, MAX_EMAIL_LEN)
    }
}

/// A user's membership in a department's support staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agent {
    pub dept_id: i32,
    pub user_id: String,
    pub head: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            user_id: "108234567890".into(),
            name: "Test".into(),
            email: "test@example.com".into(),
            picture: "http://example.com/avatar.png".into(),
        }
    }

    #[test]
    fn valid_profile() {
        assert!(profile().validate().is_ok());
    }

    #[test]
    fn rejects_empty_subject() {
        let p = Profile {
            user_id: String::new(),
            ..profile()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_long_email() {
        let p = Profile {
            email: format!("{}@example.com", "x".repeat(40)),
            ..profile()
        };
        assert!(p.validate().is_err());
    }
}
