//! PostgreSQL implementation of the target store.
//!
//! Works against the Supabase-hosted Postgres directly, so upserts are plain
//! `INSERT .. ON CONFLICT` statements and each batch is atomic.
use async_trait::async_trait;
use legacy_migrator_shared::ConflictPolicy;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::errors::TargetStoreError;
use crate::interfaces::TargetStore;
use crate::postgres::sql::{build_select, build_upsert, collect_columns};

/// Target store backed by a `PgPool`.
pub struct PostgresTargetStore {
    pool: PgPool,
}

impl PostgresTargetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TargetStore for PostgresTargetStore {
    async fn select(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<Vec<serde_json::Value>, TargetStoreError> {
        let statement = build_select(table, columns)?;
        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<serde_json::Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(TargetStoreError::from)
    }

    async fn upsert(
        &self,
        table: &str,
        primary_key: &str,
        rows: &[serde_json::Value],
        policy: ConflictPolicy,
    ) -> Result<u64, TargetStoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let columns = collect_columns(rows)?;
        let statement = build_upsert(table, primary_key, &columns, policy)?;
        debug!(table, rows = rows.len(), ?policy, "Upserting batch");

        let result = sqlx::query(&statement)
            .bind(Json(rows))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
