//! Error types for the target store.
//! Distinguishes transient failures worth retrying from failures that will
//! repeat no matter how often the batch is resent.
use thiserror::Error;

/// SQLSTATE codes that indicate a transient condition.
const RETRYABLE_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "57P01", // admin_shutdown
    "57P02", // crash_shutdown
    "57P03", // cannot_connect_now
];

/// SQLSTATE classes that indicate a transient condition.
const RETRYABLE_SQLSTATE_CLASSES: &[&str] = &[
    "08", // connection exception
    "53", // insufficient resources
];

/// Represents errors that can occur while reading from or writing to the target store.
#[derive(Debug, Error)]
pub enum TargetStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store could not be reached or answered with a transient failure.
    ///
    /// The Postgres store reports through `DatabaseError`. Stores that do not
    /// speak sqlx, such as an HTTP gateway in front of the target, map their
    /// transient failures here so the loader retries them.
    #[error("Target store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write; resending it will not help.
    ///
    /// Counterpart of `Unavailable` for stores that do not speak sqlx.
    #[error("Write rejected: {0}")]
    Rejected(String),
}

impl TargetStoreError {
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Whether resending the same request may succeed.
    ///
    /// Network, pool and resource failures are retryable; constraint violations,
    /// bad data and invalid statements are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            TargetStoreError::DatabaseError(err) => is_retryable_sqlx(err),
            TargetStoreError::Unavailable(_) => true,
            TargetStoreError::InvalidIdentifier(_)
            | TargetStoreError::Serialization(_)
            | TargetStoreError::Rejected(_) => false,
        }
    }
}

fn is_retryable_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| is_retryable_sqlstate(&code))
            .unwrap_or(false),
        _ => false,
    }
}

fn is_retryable_sqlstate(code: &str) -> bool {
    RETRYABLE_SQLSTATES.contains(&code)
        || RETRYABLE_SQLSTATE_CLASSES
            .iter()
            .any(|class| code.starts_with(class))
}
