use thiserror::Error;

/// Represents errors that can occur while persisting run records or the status row.
#[derive(Debug, Error)]
pub enum StatusStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
