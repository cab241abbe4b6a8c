use crate::errors::LegacySourceError;

/// Read-only access to the legacy relational database.
///
/// Implementations hold a pooled connection for the lifetime of a run. Errors are
/// fatal for the current run and are not retried at this layer. Callers must call
/// [`LegacySource::close`] when they are done.
#[async_trait::async_trait]
pub trait LegacySource: Send + Sync {
    /// Runs `sql` and returns every row as a JSON object keyed by column name.
    ///
    /// # Arguments
    ///
    /// * `sql` - A single `SELECT` statement, without a trailing semicolon.
    ///
    /// # Returns
    ///
    /// The rows in the order the statement produced them, or a
    /// `LegacySourceError` if the connection or the statement failed.
    async fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, LegacySourceError>;

    /// Releases the underlying connections.
    async fn close(&self);
}
