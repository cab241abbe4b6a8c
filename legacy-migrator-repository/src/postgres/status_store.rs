//! PostgreSQL implementation of the status store.
//!
//! Runs live in `migration_runs`; the dashboard polls the single
//! `migration_status` row, which is overwritten on every report.
use async_trait::async_trait;
use legacy_migrator_shared::{MigrationRun, StatusSnapshot};
use sqlx::PgPool;

use crate::errors::StatusStoreError;
use crate::interfaces::StatusStore;

pub struct PostgresStatusStore {
    pool: PgPool,
}

impl PostgresStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PostgresStatusStore {
    async fn create_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError> {
        let entity_counts = serde_json::to_value(&run.entity_counts)?;

        sqlx::query(
            "INSERT INTO migration_runs (id, status, started_at, entity_counts, details) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
        )
        .bind(run.id)
        .bind(run.state.as_str())
        .bind(run.started_at)
        .bind(entity_counts)
        .bind(&run.details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn finish_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError> {
        let entity_counts = serde_json::to_value(&run.entity_counts)?;

        // finished_at IS NULL keeps a completed run immutable
        sqlx::query(
            "UPDATE migration_runs \
             SET status = $2, finished_at = $3, entity_counts = $4, details = $5 \
             WHERE id = $1 AND finished_at IS NULL",
        )
        .bind(run.id)
        .bind(run.state.as_str())
        .bind(run.finished_at)
        .bind(entity_counts)
        .bind(&run.details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<(), StatusStoreError> {
        sqlx::query(
            "INSERT INTO migration_status \
                 (id, run_id, status, phase, loaded, total, errors, details, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                 run_id = EXCLUDED.run_id, \
                 status = EXCLUDED.status, \
                 phase = EXCLUDED.phase, \
                 loaded = EXCLUDED.loaded, \
                 total = EXCLUDED.total, \
                 errors = EXCLUDED.errors, \
                 details = EXCLUDED.details, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(&snapshot.status_id)
        .bind(snapshot.run_id)
        .bind(snapshot.state.as_str())
        .bind(snapshot.phase.map(|kind| kind.as_str()))
        .bind(snapshot.loaded as i64)
        .bind(snapshot.total as i64)
        .bind(snapshot.errors as i64)
        .bind(&snapshot.details)
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
