//! Error types for decoding legacy rows.
use thiserror::Error;

/// A legacy row that could not be read into its typed shape.
///
/// These never abort a run; the row is skipped and counted.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Malformed row in {table} (id {id:?}): {source}")]
    MalformedRow {
        table: &'static str,
        id: Option<i64>,
        #[source]
        source: serde_json::Error,
    },
}

impl TransformError {
    pub fn table(&self) -> &'static str {
        match self {
            TransformError::MalformedRow { table, .. } => table,
        }
    }
}
