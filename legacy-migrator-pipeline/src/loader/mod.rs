//! This module defines the `BatchLoader`, which writes validated rows to the
//! target store in fixed-size batches.
//!
//! Each batch is one upsert. A batch that fails with a transient error is
//! retried with exponential backoff; a batch that still fails is recorded and
//! the remaining batches are loaded anyway.
use legacy_migrator_repository::TargetStore;
use legacy_migrator_shared::{BatchOutcome, ConflictPolicy, LoadReport, TargetRow};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, info, instrument, warn};

pub use crate::errors::LoaderError;
use crate::progress::ProgressReporter;
use crate::transform::Validated;

/// Backoff applied to a failing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryConfig {
    /// Delays of roughly `base`, `2 * base`, `4 * base`, ... capped at
    /// `max_delay_ms`, with jitter.
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor((self.base_delay_ms / 2).max(1))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .map(jitter)
            .take(self.max_retries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub conflict_policy: ConflictPolicy,
    pub retry: RetryConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            conflict_policy: ConflictPolicy::Overwrite,
            retry: RetryConfig::default(),
        }
    }
}

/// Loads validated rows into the target store.
pub struct BatchLoader {
    store: Arc<dyn TargetStore>,
    config: LoaderConfig,
}

impl BatchLoader {
    /// Creates a new `BatchLoader`.
    ///
    /// A `batch_size` of 0 is treated as 1.
    pub fn new(store: Arc<dyn TargetStore>, config: LoaderConfig) -> Self {
        let config = LoaderConfig {
            batch_size: config.batch_size.max(1),
            ..config
        };
        Self { store, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Writes `rows` batch by batch, reporting progress after each batch.
    ///
    /// Never fails as a whole: per-batch failures are counted in the returned
    /// report, with their error detail.
    #[instrument(skip_all, fields(entity = %T::KIND, rows = rows.len()))]
    pub async fn load<T: TargetRow>(
        &self,
        rows: &Validated<T>,
        reporter: &ProgressReporter,
    ) -> LoadReport {
        let mut report = LoadReport::default();
        let total = rows.len() as u64;

        for (index, chunk) in rows.rows().chunks(self.config.batch_size).enumerate() {
            let outcome = self.load_batch(index, chunk).await;
            match &outcome.error {
                None => debug!(
                    batch = index,
                    size = outcome.size,
                    written = outcome.written,
                    attempts = outcome.attempts,
                    "Batch loaded"
                ),
                Some(error) => warn!(
                    batch = index,
                    size = outcome.size,
                    attempts = outcome.attempts,
                    error = %error,
                    "Batch failed"
                ),
            }
            report.record(outcome);
            reporter
                .report_progress(report.succeeded, total, report.failed)
                .await;
        }

        info!(
            entity = %T::KIND,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            batches = report.batches,
            "Load finished"
        );
        report
    }

    /// Rows of `rows` that sit in batches `report` recorded as successful.
    pub fn loaded_rows<'a, T>(&self, rows: &'a Validated<T>, report: &LoadReport) -> Vec<&'a T> {
        rows.rows()
            .chunks(self.config.batch_size)
            .enumerate()
            .filter(|(index, _)| !report.failed_batches.iter().any(|b| b.index == *index))
            .flat_map(|(_, chunk)| chunk.iter())
            .collect()
    }

    async fn load_batch<T: TargetRow>(&self, index: usize, chunk: &[T]) -> BatchOutcome {
        let values = match chunk
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(values) => values,
            Err(e) => {
                return BatchOutcome {
                    index,
                    size: chunk.len(),
                    written: 0,
                    attempts: 0,
                    error: Some(LoaderError::from(e).to_string()),
                }
            }
        };

        let attempts = AtomicU32::new(0);
        let result = RetryIf::spawn(
            self.config.retry.strategy(),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.upsert(T::KIND.table(), T::PRIMARY_KEY, &values)
            },
            |e: &LoaderError| {
                if e.is_retryable() {
                    warn!(batch = index, error = %e, "Retrying batch");
                }
                e.is_retryable()
            },
        )
        .await;

        let (written, error) = match result {
            Ok(written) => (written, None),
            Err(e) => (0, Some(e.to_string())),
        };
        BatchOutcome {
            index,
            size: chunk.len(),
            written,
            attempts: attempts.load(Ordering::SeqCst),
            error,
        }
    }

    async fn upsert(
        &self,
        table: &str,
        primary_key: &str,
        values: &[serde_json::Value],
    ) -> Result<u64, LoaderError> {
        let written = self
            .store
            .upsert(table, primary_key, values, self.config.conflict_policy)
            .await?;
        Ok(written)
    }
}
