//! PostgreSQL implementation of the legacy source.
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::errors::LegacySourceError;
use crate::interfaces::LegacySource;
use crate::postgres::sql::wrap_as_json_rows;

/// Legacy database reader backed by a `PgPool`.
pub struct PostgresLegacySource {
    pool: PgPool,
}

impl PostgresLegacySource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegacySource for PostgresLegacySource {
    async fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, LegacySourceError> {
        if self.pool.is_closed() {
            return Err(LegacySourceError::Closed);
        }

        let statement = wrap_as_json_rows(sql);
        debug!(sql = %statement, "Querying legacy database");

        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<serde_json::Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(LegacySourceError::from)
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("Closed legacy database connection");
        }
    }
}
