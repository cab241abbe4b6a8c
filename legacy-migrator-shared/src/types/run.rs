//! Migration run lifecycle.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{EntityKind, LoadReport};

/// State of a single migration run.
///
/// `NotStarted -> Running -> {Completed | Failed}`. There is no pause or resume;
/// re-running relies on reconciliation plus upserts to skip present rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid run state transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    pub fn transition(self, to: RunState) -> Result<RunState, InvalidTransition> {
        match (self, to) {
            (RunState::NotStarted, RunState::Running)
            | (RunState::Running, RunState::Completed)
            | (RunState::Running, RunState::Failed) => Ok(to),
            _ => Err(InvalidTransition { from: self, to }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::NotStarted => "not_started",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution attempt. Created when the run starts, updated once when it ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationRun {
    pub id: Uuid,
    pub state: RunState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entity_counts: BTreeMap<EntityKind, LoadReport>,
    pub details: serde_json::Value,
}

impl MigrationRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RunState::NotStarted,
            started_at: None,
            finished_at: None,
            entity_counts: BTreeMap::new(),
            details: serde_json::Value::Null,
        }
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.state = self.state.transition(RunState::Running)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Moves the run into `Completed` or `Failed`.
    pub fn finish(
        &mut self,
        outcome: RunState,
        at: DateTime<Utc>,
        details: serde_json::Value,
    ) -> Result<(), InvalidTransition> {
        if !outcome.is_terminal() {
            return Err(InvalidTransition {
                from: self.state,
                to: outcome,
            });
        }
        self.state = self.state.transition(outcome)?;
        self.finished_at = Some(at);
        self.details = details;
        Ok(())
    }
}

impl Default for MigrationRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest progress of the running phase, persisted to the shared status row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub status_id: String,
    pub run_id: Uuid,
    pub state: RunState,
    pub phase: Option<EntityKind>,
    pub loaded: u64,
    pub total: u64,
    pub errors: u64,
    pub details: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
