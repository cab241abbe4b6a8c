//! The single reference check every record passes before it is loaded.
use legacy_migrator_shared::{EntityQuality, MissingReferencePolicy, TargetRow};
use tracing::{debug, warn};

use super::{Transformed, UnresolvedReference};

/// A record dropped because of its unresolved references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub legacy_id: Option<i64>,
    pub references: Vec<UnresolvedReference>,
}

/// Rows cleared for loading.
///
/// Only [`validate_references`] builds one, so the loader never sees a record
/// whose foreign keys were not checked.
#[derive(Debug, Clone)]
pub struct Validated<T> {
    rows: Vec<T>,
    rejected: Vec<Rejection>,
}

impl<T> Validated<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Applies `policy` to the unresolved references of `records`.
///
/// Under [`MissingReferencePolicy::Reject`] any unresolved reference drops the
/// record. Under [`MissingReferencePolicy::Nullify`] records whose unresolved
/// references are all optional are kept with those columns null. A record with
/// an unresolved required reference is dropped under either policy.
pub fn validate_references<T: TargetRow>(
    records: Vec<Transformed<T>>,
    policy: MissingReferencePolicy,
    quality: &mut EntityQuality,
) -> Validated<T> {
    let mut rows = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for record in records {
        if record.unresolved.is_empty() {
            rows.push(record.row);
            continue;
        }

        let keep = policy == MissingReferencePolicy::Nullify
            && record.unresolved.iter().all(|reference| !reference.required);

        if keep {
            debug!(
                entity = %T::KIND,
                legacy_id = ?record.row.legacy_id(),
                nullified = record.unresolved.len(),
                "Nullified unresolved references"
            );
            quality.nullified_references += record.unresolved.len() as u64;
            rows.push(record.row);
        } else {
            let reasons: Vec<String> = record.unresolved.iter().map(ToString::to_string).collect();
            warn!(
                entity = %T::KIND,
                legacy_id = ?record.row.legacy_id(),
                references = %reasons.join(", "),
                "Rejected record with unresolved references"
            );
            quality.rejected_references += 1;
            rejected.push(Rejection {
                legacy_id: record.row.legacy_id(),
                references: record.unresolved,
            });
        }
    }

    Validated { rows, rejected }
}
