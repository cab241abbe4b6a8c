use legacy_migrator_shared::{MigrationRun, StatusSnapshot};

use crate::errors::StatusStoreError;

/// Persistence for run records and the shared status row dashboards poll.
#[async_trait::async_trait]
pub trait StatusStore: Send + Sync {
    /// Records a run when it starts.
    async fn create_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError>;

    /// Stores the terminal state of a run. A finished run is never updated again.
    async fn finish_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError>;

    /// Overwrites the shared status row with the latest snapshot.
    async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<(), StatusStoreError>;
}
