//! In-memory store implementations shared by the pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use legacy_migrator_repository::{
    LegacySource, LegacySourceError, StatusStore, StatusStoreError, TargetStore,
    TargetStoreError,
};
use legacy_migrator_shared::{ConflictPolicy, MigrationRun, StatusSnapshot};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

// Mock legacy database keyed by the exact extraction query
#[derive(Default)]
pub struct MockLegacySource {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    closed: AtomicBool,
    fail_on: Mutex<Option<String>>,
}

impl MockLegacySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, sql: &str, rows: Vec<Value>) -> Self {
        self.tables.lock().unwrap().insert(sql.to_string(), rows);
        self
    }

    /// Makes the given query fail as if the connection dropped.
    pub fn failing_on(self, sql: &str) -> Self {
        *self.fail_on.lock().unwrap() = Some(sql.to_string());
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegacySource for MockLegacySource {
    async fn query(&self, sql: &str) -> Result<Vec<Value>, LegacySourceError> {
        if self.is_closed() {
            return Err(LegacySourceError::Closed);
        }
        if self.fail_on.lock().unwrap().as_deref() == Some(sql) {
            return Err(LegacySourceError::Closed);
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Failure injected into the upsert calls of one table.
pub struct InjectedFailure {
    pub table: String,
    /// Zero-based upsert call (per table) at which failures start.
    pub call: usize,
    /// Number of consecutive calls that fail.
    pub times: usize,
    pub retryable: bool,
}

// Mock target store: one map per table keyed by the conflict column
#[derive(Default)]
pub struct MemoryTargetStore {
    tables: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<Vec<InjectedFailure>>,
    pub upserts: AtomicUsize,
}

impl MemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, failure: InjectedFailure) {
        self.failures.lock().unwrap().push(failure);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    pub fn seed(&self, table: &str, primary_key: &str, row: Value) {
        let key = row[primary_key].as_str().unwrap_or_default().to_string();
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .insert(key, row);
    }

    fn injected_failure(&self, table: &str) -> Option<TargetStoreError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let counter = calls.entry(table.to_string()).or_default();
            let call = *counter;
            *counter += 1;
            call
        };

        let failures = self.failures.lock().unwrap();
        failures
            .iter()
            .find(|f| f.table == table && call >= f.call && call < f.call + f.times)
            .map(|f| {
                if f.retryable {
                    TargetStoreError::unavailable("connection reset")
                } else {
                    TargetStoreError::rejected("violates check constraint")
                }
            })
    }
}

#[async_trait]
impl TargetStore for MemoryTargetStore {
    async fn select(&self, table: &str, columns: &[&str]) -> Result<Vec<Value>, TargetStoreError> {
        let tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .values()
            .map(|row| {
                let projected: Map<String, Value> = columns
                    .iter()
                    .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                    .collect();
                Value::Object(projected)
            })
            .collect())
    }

    async fn upsert(
        &self,
        table: &str,
        primary_key: &str,
        rows: &[Value],
        policy: ConflictPolicy,
    ) -> Result<u64, TargetStoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure(table) {
            return Err(err);
        }

        let mut tables = self.tables.lock().unwrap();
        let stored = tables.entry(table.to_string()).or_default();
        let mut written = 0;
        for row in rows {
            let key = row
                .get(primary_key)
                .and_then(Value::as_str)
                .ok_or_else(|| TargetStoreError::serialization("missing primary key"))?
                .to_string();
            if stored.contains_key(&key) && policy == ConflictPolicy::Skip {
                continue;
            }
            stored.insert(key, row.clone());
            written += 1;
        }
        Ok(written)
    }
}

// Mock status store recording everything it is sent
#[derive(Default)]
pub struct RecordingStatusStore {
    pub created: Mutex<Vec<MigrationRun>>,
    pub finished: Mutex<Vec<MigrationRun>>,
    pub snapshots: Mutex<Vec<StatusSnapshot>>,
}

impl RecordingStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_snapshot(&self) -> Option<StatusSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl StatusStore for RecordingStatusStore {
    async fn create_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError> {
        self.created.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn finish_run(&self, run: &MigrationRun) -> Result<(), StatusStoreError> {
        self.finished.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<(), StatusStoreError> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}
