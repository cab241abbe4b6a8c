use thiserror::Error;

/// Represents errors that can occur while reading the legacy database.
///
/// Any of these aborts the current run.
#[derive(Debug, Error)]
pub enum LegacySourceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Legacy connection is closed")]
    Closed,
}
