//! Repository error type
//!
//! Constraint violations reported by Postgres are mapped onto domain
//! variants here so repositories never need a check-then-insert.

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} already exists")]
    UniqueViolation { resource: &'static str },

    #[error("forbidden: {reason}")]
    Forbidden { reason: &'static str },

    #[error("a user cannot follow themself")]
    SelfFollow,
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Classify an insert failure.
    ///
    /// Unique violations become `UniqueViolation { resource }`, foreign key
    /// violations become `NotFound { resource: missing, id }` for the
    /// referenced row, anything else stays a plain sqlx error.
    pub(crate) fn on_insert(
        err: sqlx::Error,
        resource: &'static str,
        missing: &'static str,
        missing_id: impl ToString,
    ) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::UniqueViolation { resource }
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::not_found(missing, missing_id)
            }
            other => Self::Sqlx(other),
        }
    }
}
