//! This module maps legacy rows onto target rows.
//!
//! Transformers are pure: they read a legacy row and the identifier maps and
//! return either a ready record or the reason it was skipped. Anything they
//! recover from (unknown codes, missing fields, bad UUIDs) is counted in the
//! entity's data-quality counters. Foreign keys they cannot resolve are carried
//! on the record for [`validate_references`] to decide on.
mod case;
mod case_file;
mod context;
mod member;
mod patient;
mod practice;
mod profile;
mod time;
mod validate;

pub use case::{project_for_case, transform_case, CaseMaps};
pub use case_file::{transform_case_file, CaseFileMaps};
pub use context::RecordContext;
pub use member::{transform_member, MemberMaps};
pub use patient::{transform_patient, PatientResolver};
pub use practice::transform_practice;
pub use profile::{transform_profile, ProfileMaps};
pub use time::{parse_date, parse_timestamp};
pub use validate::{validate_references, Rejection, Validated};

use legacy_migrator_shared::{EntityKind, TargetRow};
use std::fmt;
use uuid::Uuid;

/// A foreign key whose legacy id had no target mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub column: &'static str,
    pub target: EntityKind,
    /// `None` when the legacy row had no value for a required reference.
    pub legacy_id: Option<i64>,
    pub required: bool,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.legacy_id {
            Some(id) => write!(f, "{} -> {} {} not migrated", self.column, self.target, id),
            None => write!(f, "{} missing", self.column),
        }
    }
}

/// A target row plus the references it could not resolve.
///
/// Unresolved required references hold the nil UUID, unresolved optional ones
/// hold `None`; either way the record must pass [`validate_references`] before
/// it can be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    pub row: T,
    pub unresolved: Vec<UnresolvedReference>,
}

impl<T: TargetRow> Transformed<T> {
    /// A record with every reference resolved.
    pub fn resolved(row: T) -> Self {
        Self {
            row,
            unresolved: Vec::new(),
        }
    }
}

/// Why a legacy row was deliberately not migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The email already belongs to a profile migrated from another user, or
    /// created outside the migration.
    DuplicateEmail { existing: Uuid },
    /// Another legacy patient with the same name and birthdate already owns the
    /// target patient.
    DuplicatePatient { existing: Uuid },
    MissingFileUrl,
    MalformedRow,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DuplicateEmail { .. } => "duplicate_email",
            SkipReason::DuplicatePatient { .. } => "duplicate_patient",
            SkipReason::MissingFileUrl => "missing_file_url",
            SkipReason::MalformedRow => "malformed_row",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of transforming one legacy row.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome<T> {
    Ready(Transformed<T>),
    Skipped(SkipReason),
}

impl<T> TransformOutcome<T> {
    pub fn ready(self) -> Option<Transformed<T>> {
        match self {
            TransformOutcome::Ready(record) => Some(record),
            TransformOutcome::Skipped(_) => None,
        }
    }
}
