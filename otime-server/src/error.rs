use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    EventNotFound(String),

    #[error("club {0} not found")]
    ClubNotFound(i64),

    #[error("competitor {0} not found")]
    CompetitorNotFound(i64),

    #[error("course {0} not found")]
    CourseNotFound(i64),

    #[error("class {0} not found")]
    ClassNotFound(i64),

    #[error("entry {0} not found")]
    EntryNotFound(i64),

    /// A domain constraint was violated; the message is user-facing.
    #[error("{0}")]
    Constraint(String),

    /// A malformed incoming message or request.
    #[error("invalid message: {0}")]
    Validation(String),

    #[error("stored data corrupt: {0}")]
    Data(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub fn constraint(message: impl Into<String>) -> Self {
        Error::Constraint(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::EventNotFound(_)
                | Error::ClubNotFound(_)
                | Error::CompetitorNotFound(_)
                | Error::CourseNotFound(_)
                | Error::ClassNotFound(_)
                | Error::EntryNotFound(_)
        )
    }

    /// Failures after which an orchestrated mutation re-probes its referenced
    /// rows to attach a specific message before re-raising.
    pub(crate) fn needs_reprobe(&self) -> bool {
        match self {
            Error::Constraint(_) => true,
            Error::Database(e) => e.as_database_error().is_some(),
            e => e.is_not_found(),
        }
    }
}

/// Map a unique-constraint violation onto a domain message, leaving every
/// other database error untouched.
pub(crate) fn map_unique(err: sqlx::Error, message: &str) -> Error {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => Error::Constraint(message.to_string()),
        _ => Error::Database(err),
    }
}

/// Map a foreign-key violation (typically a constrained delete) onto a
/// domain message.
pub(crate) fn map_foreign_key(err: sqlx::Error, message: &str) -> Error {
    match err.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => Error::Constraint(message.to_string()),
        _ => Error::Database(err),
    }
}
