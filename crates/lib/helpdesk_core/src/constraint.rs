//! Constraint translation.
//!
//! Mutating statements that can trip a foreign-key or uniqueness constraint
//! run through [`StoreResultExt::store_result`], which splits the outcome into
//! a fatal storage fault and a [`StoreFailure`] naming the offending table and
//! constraint. Each operation then resolves the failure against its own
//! [`ConstraintMap`]. A failure the operation did not declare is fatal.

use crate::error::{DataError, Result};

/// SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// The two classes of constraint failure that can become domain outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureClass {
    /// A referenced row does not exist.
    Referential,
    /// A row with the same key already exists.
    Uniqueness,
}

impl FailureClass {
    /// Maps a SQLSTATE to its failure class, if translatable.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            FOREIGN_KEY_VIOLATION => Some(Self::Referential),
            UNIQUE_VIOLATION => Some(Self::Uniqueness),
            _ => None,
        }
    }

    /// The SQLSTATE this class is raised with.
    pub fn code(self) -> &'static str {
        match self {
            Self::Referential => FOREIGN_KEY_VIOLATION,
            Self::Uniqueness => UNIQUE_VIOLATION,
        }
    }

    /// Whether a `pg_constraint.contype` value can raise this class.
    pub fn raised_by(self, contype: &str) -> bool {
        match self {
            Self::Referential => contype == "f",
            Self::Uniqueness => contype == "p" || contype == "u",
        }
    }
}

/// A translatable constraint failure reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    pub class: FailureClass,
    pub table: String,
    pub constraint: String,
}

/// Splits a `sqlx` result into fatal faults and translatable failures.
pub trait StoreResultExt<T> {
    /// Returns `Ok(Err(failure))` for foreign-key and uniqueness violations
    /// that name both a table and a constraint. Every other error is returned
    /// in the outer `Err`.
    fn store_result(self) -> Result<std::result::Result<T, StoreFailure>>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn store_result(self) -> Result<std::result::Result<T, StoreFailure>> {
        let err = match self {
            Ok(value) => return Ok(Ok(value)),
            Err(sqlx::Error::Database(err)) => err,
            Err(err) => return Err(err.into()),
        };

        let class = err.code().as_deref().and_then(FailureClass::from_code);
        let failure = match (class, err.table(), err.constraint()) {
            (Some(class), Some(table), Some(constraint)) => Some(StoreFailure {
                class,
                table: table.to_owned(),
                constraint: constraint.to_owned(),
            }),
            _ => None,
        };

        match failure {
            Some(failure) => Ok(Err(failure)),
            None => Err(DataError::DbError(sqlx::Error::Database(err))),
        }
    }
}

/// Identifies one declared constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKey {
    pub class: FailureClass,
    pub table: &'static str,
    pub constraint: &'static str,
}

impl ConstraintKey {
    fn matches(&self, failure: &StoreFailure) -> bool {
        self.class == failure.class
            && self.table == failure.table
            && self.constraint == failure.constraint
    }
}

/// Maps the constraint failures an operation can legitimately hit to its
/// domain outcomes.
#[derive(Debug, Clone)]
pub struct ConstraintMap<T> {
    entries: Vec<(ConstraintKey, T)>,
}

impl<T: Copy> ConstraintMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declares a foreign key whose violation yields `outcome`.
    pub fn referential(self, table: &'static str, constraint: &'static str, outcome: T) -> Self {
        self.with(FailureClass::Referential, table, constraint, outcome)
    }

    /// Declares a primary key or unique constraint whose violation yields `outcome`.
    pub fn unique(self, table: &'static str, constraint: &'static str, outcome: T) -> Self {
        self.with(FailureClass::Uniqueness, table, constraint, outcome)
    }

    fn with(
        mut self,
        class: FailureClass,
        table: &'static str,
        constraint: &'static str,
        outcome: T,
    ) -> Self {
        let key = ConstraintKey {
            class,
            table,
            constraint,
        };
        // Maps are static tables; a duplicate is a typo in the declaration.
        assert!(
            !self.entries.iter().any(|(k, _)| *k == key),
            "constraint {constraint} on {table} declared twice"
        );
        self.entries.push((key, outcome));
        self
    }

    /// Translates a failure into the declared outcome.
    pub fn translate(&self, failure: &StoreFailure) -> Result<T> {
        self.entries
            .iter()
            .find(|(key, _)| key.matches(failure))
            .map(|(_, outcome)| *outcome)
            .ok_or_else(|| DataError::UnexpectedConstraint {
                code: failure.class.code().to_owned(),
                table: failure.table.clone(),
                constraint: failure.constraint.clone(),
            })
    }

    /// Resolves a store attempt: success goes through `on_success`, failures
    /// through [`ConstraintMap::translate`].
    pub fn resolve<V>(
        &self,
        attempt: std::result::Result<V, StoreFailure>,
        on_success: impl FnOnce(V) -> T,
    ) -> Result<T> {
        match attempt {
            Ok(value) => Ok(on_success(value)),
            Err(failure) => {
                let outcome = self.translate(&failure)?;
                tracing::debug!(
                    table = %failure.table,
                    constraint = %failure.constraint,
                    "constraint failure translated"
                );
                Ok(outcome)
            }
        }
    }

    /// The constraints this map declares.
    pub fn keys(&self) -> impl Iterator<Item = ConstraintKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }
}

impl<T: Copy> Default for ConstraintMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every constraint declared by any operation, deduplicated.
///
/// [`crate::Database::verify_constraints`] checks this list against the live
/// schema at startup.
pub fn declared() -> Vec<ConstraintKey> {
    let mut keys: Vec<ConstraintKey> = crate::session::queries::constraint_keys()
        .into_iter()
        .chain(crate::registry::constraint_keys())
        .chain(crate::ticket::queries::constraint_keys())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Outcome {
        Success,
        Exists,
        NoDept,
        NoUser,
    }

    fn map() -> ConstraintMap<Outcome> {
        ConstraintMap::new()
            .referential("dept_agents", "dept_agents_dept_id_fkey", Outcome::NoDept)
            .referential("dept_agents", "dept_agents_user_id_fkey", Outcome::NoUser)
            .unique("dept_agents", "dept_agents_pkey", Outcome::Exists)
    }

    fn failure(class: FailureClass, table: &str, constraint: &str) -> StoreFailure {
        StoreFailure {
            class,
            table: table.into(),
            constraint: constraint.into(),
        }
    }

    #[test]
    fn classifies_sqlstate() {
        assert_eq!(
            FailureClass::from_code("23503"),
            Some(FailureClass::Referential)
        );
        assert_eq!(
            FailureClass::from_code("23505"),
            Some(FailureClass::Uniqueness)
        );
        assert_eq!(FailureClass::from_code("23514"), None);
        assert_eq!(FailureClass::from_code("P0004"), None);
    }

    #[test]
    fn contype_matches_class() {
        assert!(FailureClass::Referential.raised_by("f"));
        assert!(!FailureClass::Referential.raised_by("p"));
        assert!(FailureClass::Uniqueness.raised_by("p"));
        assert!(FailureClass::Uniqueness.raised_by("u"));
        assert!(!FailureClass::Uniqueness.raised_by("c"));
    }

    #[test]
    fn translates_declared_failures() {
        let map = map();
        let cases = [
            (
                failure(FailureClass::Referential, "dept_agents", "dept_agents_dept_id_fkey"),
                Outcome::NoDept,
            ),
            (
                failure(FailureClass::Referential, "dept_agents", "dept_agents_user_id_fkey"),
                Outcome::NoUser,
            ),
            (
                failure(FailureClass::Uniqueness, "dept_agents", "dept_agents_pkey"),
                Outcome::Exists,
            ),
        ];
        for (failure, expected) in cases {
            assert_eq!(map.translate(&failure).unwrap(), expected);
        }
    }

    #[test]
    fn undeclared_failure_is_fatal() {
        let map = map();
        let err = map
            .translate(&failure(
                FailureClass::Referential,
                "assignments",
                "assignments_ticket_id_fkey",
            ))
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("assignments_ticket_id_fkey"));
    }

    #[test]
    fn class_must_match_too() {
        let map = map();
        let err = map
            .translate(&failure(
                FailureClass::Uniqueness,
                "dept_agents",
                "dept_agents_dept_id_fkey",
            ))
            .unwrap_err();
        assert!(matches!(err, DataError::UnexpectedConstraint { .. }));
    }

    #[test]
    fn resolve_passes_success_through() {
        let map = map();
        assert_eq!(map.resolve(Ok(()), |_| Outcome::Success).unwrap(), Outcome::Success);
        let attempt: std::result::Result<(), _> = Err(failure(
            FailureClass::Uniqueness,
            "dept_agents",
            "dept_agents_pkey",
        ));
        assert_eq!(map.resolve(attempt, |_| Outcome::Success).unwrap(), Outcome::Exists);
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn duplicate_declaration_panics() {
        let _ = ConstraintMap::new()
            .unique("labels", "labels_pkey", Outcome::Exists)
            .unique("labels", "labels_pkey", Outcome::Exists);
    }

    #[test]
    fn non_database_errors_stay_fatal() {
        let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        assert!(matches!(
            result.store_result(),
            Err(DataError::DbError(sqlx::Error::RowNotFound))
        ));
    }

    #[test]
    fn declared_constraints_are_unique_and_named() {
        let keys = declared();
        assert!(!keys.is_empty());
        for pair in keys.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert!(keys.iter().all(|k| k.constraint.starts_with(k.table)));
    }
}
