//! Dependency initialization and wiring for the legacy migrator.
use legacy_migrator_pipeline::embeddings::EmbeddingGenerator;
use legacy_migrator_pipeline::orchestrator::Migrator;
use legacy_migrator_repository::postgres::connect;
use legacy_migrator_repository::{PostgresLegacySource, PostgresStatusStore, PostgresTargetStore};
use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseSettings, Settings};
use crate::errors::AppError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured migrator ready to run.
    pub migrator: Migrator,
}

impl Dependencies {
    /// Connects both databases and builds the migrator.
    ///
    /// The status surface lives in the target database, so the status store
    /// shares the target pool.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If a connection cannot be opened
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        info!(
            legacy = %settings.legacy.describe(),
            target = %settings.target.describe(),
            batch_size = settings.migration.loader.batch_size,
            conflict_policy = ?settings.migration.loader.conflict_policy,
            missing_reference = ?settings.migration.missing_reference,
            project_mapping = ?settings.migration.project_mapping,
            embeddings = settings.embeddings.is_some(),
            "Initializing dependencies"
        );

        let legacy_pool = Self::connect_to(&settings.legacy).await?;
        info!("Legacy database connection established");
        let target_pool = Self::connect_to(&settings.target).await?;
        info!("Target database connection established");

        let legacy = Arc::new(PostgresLegacySource::new(legacy_pool));
        let target = Arc::new(PostgresTargetStore::new(target_pool.clone()));
        let status = Arc::new(PostgresStatusStore::new(target_pool));

        let mut migrator = Migrator::new(legacy, target, status, settings.migration);
        if let Some(config) = &settings.embeddings {
            info!(api_url = %config.api_url, model = %config.model, "Embedding generation enabled");
            migrator = migrator.with_embeddings(EmbeddingGenerator::from_config(config));
        }

        Ok(Self { migrator })
    }

    async fn connect_to(database: &DatabaseSettings) -> Result<sqlx::PgPool, AppError> {
        let options = database.connect_options()?;
        let pool = connect(options, database.max_connections()).await?;
        Ok(pool)
    }
}
