//! Legacy Migrator Main Entry Point
//!
//! Runs one migration of the legacy practice database into the target and
//! exits non-zero if the run fails.

use dotenv::dotenv;
use legacy_migrator::{AppError, Dependencies, Settings};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "legacy_migrator=info,legacy_migrator_pipeline=info,legacy_migrator_repository=info",
        )
    });

    let json = env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| AppError::Tracing(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| AppError::Tracing(e.to_string()))?;
    }

    info!(
        service_name = "legacy-migrator",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting legacy migration");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let deps = match Dependencies::new(settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.migrator.run().await {
        Ok(summary) => {
            if summary.total_failed() > 0 {
                warn!(
                    failed = summary.total_failed(),
                    "Migration completed with failed batches"
                );
            }
            info!(run_id = %summary.run_id, "Migration completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Migration failed");
            Err(e.into())
        }
    }
}
