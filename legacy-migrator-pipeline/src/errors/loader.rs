//! Error types for the batch loader.
//! A `LoaderError` fails one batch; later batches still run.
use legacy_migrator_repository::TargetStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Target store error: {0}")]
    TargetStore(#[from] TargetStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoaderError {
    /// Whether resending the batch may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LoaderError::TargetStore(err) => err.is_retryable(),
            LoaderError::Serialization(_) => false,
        }
    }
}
