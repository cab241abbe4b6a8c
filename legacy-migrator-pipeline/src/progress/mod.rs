//! This module defines the `ProgressReporter`, which keeps the run record and
//! the shared status row in step with the migration.
//!
//! Status writes are best effort: a failed write is logged and the migration
//! carries on.
use chrono::{DateTime, Utc};
use legacy_migrator_repository::StatusStore;
use legacy_migrator_shared::{
    EntityKind, InvalidTransition, LoadReport, MigrationRun, RunState, StatusSnapshot,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

struct ReporterState {
    run: MigrationRun,
    phase: Option<EntityKind>,
    loaded: u64,
    total: u64,
    errors: u64,
}

/// Publishes the lifecycle and progress of one migration run.
pub struct ProgressReporter {
    store: Arc<dyn StatusStore>,
    status_id: String,
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    /// Creates a reporter for a new, not yet started run.
    ///
    /// # Arguments
    ///
    /// * `store` - Where run records and the status row are written.
    /// * `status_id` - Key of the shared status row.
    pub fn new(store: Arc<dyn StatusStore>, status_id: impl Into<String>) -> Self {
        Self {
            store,
            status_id: status_id.into(),
            state: Mutex::new(ReporterState {
                run: MigrationRun::new(),
                phase: None,
                loaded: 0,
                total: 0,
                errors: 0,
            }),
        }
    }

    pub async fn run_id(&self) -> Uuid {
        self.state.lock().await.run.id
    }

    pub async fn run_state(&self) -> RunState {
        self.state.lock().await.run.state
    }

    pub async fn started_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.run.started_at
    }

    /// Moves the run to `running` and records it.
    pub async fn start(&self) -> Result<(), InvalidTransition> {
        let run = {
            let mut state = self.state.lock().await;
            state.run.start(Utc::now())?;
            state.run.clone()
        };
        info!(run_id = %run.id, "Migration run started");

        if let Err(e) = self.store.create_run(&run).await {
            warn!(run_id = %run.id, error = %e, "Failed to record migration run");
        }
        self.publish(serde_json::Value::Null).await;
        Ok(())
    }

    /// Switches the status row to a new phase and resets its counters.
    pub async fn begin_phase(&self, phase: EntityKind, total: u64) {
        {
            let mut state = self.state.lock().await;
            state.phase = Some(phase);
            state.loaded = 0;
            state.total = total;
            state.errors = 0;
        }
        self.publish(serde_json::Value::Null).await;
    }

    /// Records the latest counts of the running phase.
    pub async fn report_progress(&self, loaded: u64, total: u64, errors: u64) {
        {
            let mut state = self.state.lock().await;
            state.loaded = loaded;
            state.total = total;
            state.errors = errors;
        }
        self.publish(serde_json::Value::Null).await;
    }

    /// Stores the load counts of a finished phase on the run record.
    pub async fn record_counts(&self, kind: EntityKind, report: &LoadReport) {
        let mut state = self.state.lock().await;
        state.run.entity_counts.insert(kind, report.clone());
    }

    /// Marks the run completed with a diagnostic payload.
    pub async fn complete(&self, details: serde_json::Value) -> Result<(), InvalidTransition> {
        self.finish(RunState::Completed, details).await
    }

    /// Marks the run failed with a diagnostic payload.
    pub async fn fail(&self, details: serde_json::Value) -> Result<(), InvalidTransition> {
        self.finish(RunState::Failed, details).await
    }

    async fn finish(
        &self,
        outcome: RunState,
        details: serde_json::Value,
    ) -> Result<(), InvalidTransition> {
        let run = {
            let mut state = self.state.lock().await;
            state.run.finish(outcome, Utc::now(), details.clone())?;
            state.run.clone()
        };
        info!(run_id = %run.id, state = %run.state, "Migration run finished");

        if let Err(e) = self.store.finish_run(&run).await {
            warn!(run_id = %run.id, error = %e, "Failed to record migration run result");
        }
        self.publish(details).await;
        Ok(())
    }

    async fn publish(&self, details: serde_json::Value) {
        let snapshot = {
            let state = self.state.lock().await;
            StatusSnapshot {
                status_id: self.status_id.clone(),
                run_id: state.run.id,
                state: state.run.state,
                phase: state.phase,
                loaded: state.loaded,
                total: state.total,
                errors: state.errors,
                details,
                updated_at: Utc::now(),
            }
        };

        if let Err(e) = self.store.publish_status(&snapshot).await {
            warn!(
                status_id = %snapshot.status_id,
                error = %e,
                "Failed to publish migration status"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legacy_migrator_repository::StatusStoreError;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingStatusStore {
        snapshots: std::sync::Mutex<Vec<StatusSnapshot>>,
        finished: std::sync::Mutex<Vec<MigrationRun>>,
        broken: AtomicBool,
    }

    fn broken_error() -> StatusStoreError {
        StatusStoreError::Serialization(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
    }

    #[async_trait]
    impl StatusStore for RecordingStatusStore {
        async fn create_run(&self, _run: &MigrationRun) -> Result<(), StatusStoreError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(broken_error());
            }
            Ok(())
        }

        async fn finish_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(broken_error());
            }
            self.finished.lock().unwrap().push(run.clone());
            Ok(())
        }

        async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<(), StatusStoreError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(broken_error());
            }
            self.snapshots.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reports_progress_per_phase() {
        let store = Arc::new(RecordingStatusStore::default());
        let reporter = ProgressReporter::new(store.clone(), "legacy_migration");

        reporter.start().await.unwrap();
        reporter.begin_phase(EntityKind::Practice, 250).await;
        reporter.report_progress(100, 250, 0).await;
        reporter.report_progress(200, 250, 100).await;

        let snapshots = store.snapshots.lock().unwrap().clone();
        let last = snapshots.last().unwrap();
        assert_eq!(last.status_id, "legacy_migration");
        assert_eq!(last.state, RunState::Running);
        assert_eq!(last.phase, Some(EntityKind::Practice));
        assert_eq!((last.loaded, last.total, last.errors), (200, 250, 100));
    }

    #[tokio::test]
    async fn test_complete_finishes_the_run_once() {
        let store = Arc::new(RecordingStatusStore::default());
        let reporter = ProgressReporter::new(store.clone(), "legacy_migration");

        reporter.start().await.unwrap();
        reporter
            .complete(serde_json::json!({"written": 3}))
            .await
            .unwrap();
        assert!(reporter.fail(serde_json::Value::Null).await.is_err());

        let finished = store.finished.lock().unwrap().clone();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].state, RunState::Completed);
        assert_eq!(finished[0].details["written"], 3);
        assert_eq!(reporter.run_state().await, RunState::Completed);
    }

    #[tokio::test]
    async fn test_cannot_complete_before_start() {
        let store = Arc::new(RecordingStatusStore::default());
        let reporter = ProgressReporter::new(store, "legacy_migration");
        assert!(reporter.complete(serde_json::Value::Null).await.is_err());
    }

    #[tokio::test]
    async fn test_status_store_failures_are_not_fatal() {
        let store = Arc::new(RecordingStatusStore::default());
        store.broken.store(true, Ordering::SeqCst);
        let reporter = ProgressReporter::new(store.clone(), "legacy_migration");

        reporter.start().await.unwrap();
        reporter.report_progress(1, 2, 0).await;
        reporter.fail(serde_json::json!({"error": "boom"})).await.unwrap();

        assert_eq!(reporter.run_state().await, RunState::Failed);
        assert!(store.snapshots.lock().unwrap().is_empty());
    }
}
