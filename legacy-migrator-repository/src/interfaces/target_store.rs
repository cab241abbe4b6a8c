use legacy_migrator_shared::ConflictPolicy;

use crate::errors::TargetStoreError;

/// Select and upsert access to the target store.
///
/// Rows travel as JSON objects whose keys are column names, which keeps the
/// store agnostic of the entity types the pipeline migrates.
#[async_trait::async_trait]
pub trait TargetStore: Send + Sync {
    /// Reads `columns` of every row in `table`.
    ///
    /// # Arguments
    ///
    /// * `table` - Target table name.
    /// * `columns` - Columns to project; each returned object has exactly these keys.
    ///
    /// # Returns
    ///
    /// One JSON object per row, or a `TargetStoreError` if the read fails.
    async fn select(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<Vec<serde_json::Value>, TargetStoreError>;

    /// Inserts `rows` into `table`, resolving primary-key conflicts per `policy`.
    ///
    /// The whole slice is written as one statement: either every row is applied
    /// or none is.
    ///
    /// # Arguments
    ///
    /// * `table` - Target table name.
    /// * `primary_key` - Conflict target column.
    /// * `rows` - JSON objects keyed by column name.
    /// * `policy` - Whether conflicting rows are overwritten or left untouched.
    ///
    /// # Returns
    ///
    /// The number of rows inserted or updated.
    async fn upsert(
        &self,
        table: &str,
        primary_key: &str,
        rows: &[serde_json::Value],
        policy: ConflictPolicy,
    ) -> Result<u64, TargetStoreError>;
}
