//! Counters produced by a migration run.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::{EntityKind, RunState};

/// Outcome of one batch write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Zero-based batch index within the load.
    pub index: usize,
    pub size: usize,
    /// Rows the store reported as inserted or updated.
    pub written: u64,
    /// Number of attempts made, retries included.
    pub attempts: u32,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Counts for loading one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub written: u64,
    pub batches: u64,
    /// Only failed batches are kept, with their error detail.
    pub failed_batches: Vec<BatchOutcome>,
}

impl LoadReport {
    pub fn record(&mut self, outcome: BatchOutcome) {
        let size = outcome.size as u64;
        self.attempted += size;
        self.batches += 1;
        if outcome.succeeded() {
            self.succeeded += size;
            self.written += outcome.written;
        } else {
            self.failed += size;
            self.failed_batches.push(outcome);
        }
    }

    pub fn merge(&mut self, other: LoadReport) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.written += other.written;
        self.batches += other.batches;
        self.failed_batches.extend(other.failed_batches);
    }
}

/// Data-quality counters for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityQuality {
    /// Legacy UUIDs that were present but invalid and got replaced.
    pub substituted_ids: u64,
    /// Required fields filled with a documented default.
    pub defaulted_fields: u64,
    /// Legacy enum codes that were present but unknown.
    pub unmapped_codes: u64,
    /// Records dropped because a reference could not be resolved.
    pub rejected_references: u64,
    /// Optional references written as null because they could not be resolved.
    pub nullified_references: u64,
}

impl EntityQuality {
    pub fn is_clean(&self) -> bool {
        *self == EntityQuality::default()
    }
}

/// Structured report of every place the migration traded fidelity for success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub entities: BTreeMap<EntityKind, EntityQuality>,
}

impl DataQualityReport {
    pub fn entry(&mut self, kind: EntityKind) -> &mut EntityQuality {
        self.entities.entry(kind).or_default()
    }

    pub fn get(&self, kind: EntityKind) -> EntityQuality {
        self.entities.get(&kind).cloned().unwrap_or_default()
    }

    pub fn total_substituted_ids(&self) -> u64 {
        self.entities.values().map(|q| q.substituted_ids).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.entities.values().all(EntityQuality::is_clean)
    }
}

/// Per-phase result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub kind: EntityKind,
    /// Legacy rows read.
    pub extracted: u64,
    /// Rows deliberately not migrated (duplicates, missing required data).
    pub skipped: u64,
    /// Rows dropped by reference validation.
    pub rejected: u64,
    pub skip_reasons: BTreeMap<String, u64>,
    pub load: LoadReport,
}

impl EntityReport {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            extracted: 0,
            skipped: 0,
            rejected: 0,
            skip_reasons: BTreeMap::new(),
            load: LoadReport::default(),
        }
    }

    pub fn record_skip(&mut self, reason: impl Into<String>) {
        self.skipped += 1;
        *self.skip_reasons.entry(reason.into()).or_default() += 1;
    }
}

/// Final summary of a run, printed to the console and stored with the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entities: Vec<EntityReport>,
    pub data_quality: DataQualityReport,
}

impl RunSummary {
    pub fn report(&self, kind: EntityKind) -> Option<&EntityReport> {
        self.entities.iter().find(|r| r.kind == kind)
    }

    pub fn total_failed(&self) -> u64 {
        self.entities.iter().map(|r| r.load.failed).sum()
    }

    pub fn total_written(&self) -> u64 {
        self.entities.iter().map(|r| r.load.written).sum()
    }
}
