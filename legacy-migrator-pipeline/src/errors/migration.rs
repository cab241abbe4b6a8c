//! Error types for the migration orchestrator.
//! Every variant here is fatal for the run.
use legacy_migrator_repository::{LegacySourceError, TargetStoreError};
use legacy_migrator_shared::InvalidTransition;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Legacy source error: {0}")]
    LegacySource(#[from] LegacySourceError),

    #[error("Reconciliation failed: {0}")]
    Reconciliation(#[from] TargetStoreError),

    #[error("Run state error: {0}")]
    RunState(#[from] InvalidTransition),
}
