//! Operator-selectable policies.
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for {setting}, expected one of: {expected}")]
pub struct ParsePolicyError {
    pub setting: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// What an upsert does when the primary key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// `ON CONFLICT (pk) DO UPDATE`
    #[default]
    Overwrite,
    /// `ON CONFLICT (pk) DO NOTHING`
    Skip,
}

impl FromStr for ConflictPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" | "update" | "upsert" => Ok(Self::Overwrite),
            "skip" | "ignore" | "nothing" => Ok(Self::Skip),
            _ => Err(ParsePolicyError {
                setting: "conflict policy",
                value: s.to_string(),
                expected: "overwrite, skip",
            }),
        }
    }
}

/// What happens to a record whose legacy foreign key has no target mapping.
///
/// Applied by one shared validation step before every batch write. Required
/// references are rejected under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReferencePolicy {
    /// Drop the record and log it.
    #[default]
    Reject,
    /// Write the record with the optional reference set to null.
    Nullify,
}

impl FromStr for MissingReferencePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "skip" => Ok(Self::Reject),
            "nullify" | "null" => Ok(Self::Nullify),
            _ => Err(ParsePolicyError {
                setting: "missing reference policy",
                value: s.to_string(),
                expected: "reject, nullify",
            }),
        }
    }
}

/// How legacy projects land in the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMapping {
    /// One `cases` row plus one `projects` row referencing it.
    #[default]
    Split,
    /// Only the `cases` row.
    CasesOnly,
}

impl FromStr for ProjectMapping {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "split" | "both" => Ok(Self::Split),
            "cases_only" | "cases" => Ok(Self::CasesOnly),
            _ => Err(ParsePolicyError {
                setting: "project mapping",
                value: s.to_string(),
                expected: "split, cases_only",
            }),
        }
    }
}
