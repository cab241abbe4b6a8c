//! In-memory lookups from legacy identifiers to target UUIDs.
//!
//! Maps live for one process and are rebuilt from the target store before every
//! phase; they are never persisted on their own.
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use crate::types::EntityKind;

/// Legacy integer id -> target UUID for one entity kind.
#[derive(Debug, Clone)]
pub struct IdMap {
    kind: EntityKind,
    ids: HashMap<i64, Uuid>,
}

impl IdMap {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            ids: HashMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Records a mapping, returning the UUID it replaced if the legacy id was
    /// already mapped.
    pub fn insert(&mut self, legacy_id: i64, target_id: Uuid) -> Option<Uuid> {
        self.ids.insert(legacy_id, target_id)
    }

    pub fn get(&self, legacy_id: i64) -> Option<Uuid> {
        self.ids.get(&legacy_id).copied()
    }

    /// Resolves an optional legacy foreign key.
    pub fn resolve(&self, legacy_id: Option<i64>) -> Option<Uuid> {
        legacy_id.and_then(|id| self.get(id))
    }

    pub fn contains(&self, legacy_id: i64) -> bool {
        self.ids.contains_key(&legacy_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, Uuid)> + '_ {
        self.ids.iter().map(|(legacy_id, target_id)| (*legacy_id, *target_id))
    }
}

impl Extend<(i64, Uuid)> for IdMap {
    fn extend<I: IntoIterator<Item = (i64, Uuid)>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

/// Existing profiles keyed by lower-cased email.
#[derive(Debug, Clone, Default)]
pub struct EmailIndex {
    entries: HashMap<String, (Uuid, Option<i64>)>,
}

impl EmailIndex {
    pub fn insert(&mut self, email: &str, profile_id: Uuid, legacy_user_id: Option<i64>) {
        self.entries
            .insert(normalize_email(email), (profile_id, legacy_user_id));
    }

    /// Returns the profile id and the legacy user it was migrated from, if any.
    pub fn get(&self, email: &str) -> Option<(Uuid, Option<i64>)> {
        self.entries.get(&normalize_email(email)).copied()
    }

    pub fn profile_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.entries.values().map(|(id, _)| *id)
    }

    /// Keeps only the emails whose profile satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Uuid) -> bool) {
        self.entries.retain(|_, (id, _)| keep(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Existing patients keyed by name and birthdate.
#[derive(Debug, Clone, Default)]
pub struct PatientKeyIndex {
    entries: HashMap<String, Uuid>,
}

impl PatientKeyIndex {
    pub fn insert(&mut self, key: String, patient_id: Uuid) {
        self.entries.insert(key, patient_id);
    }

    pub fn get(&self, key: &str) -> Option<Uuid> {
        self.entries.get(key).copied()
    }

    pub fn patient_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.entries.values().copied()
    }

    /// Keeps only the keys whose patient satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Uuid) -> bool) {
        self.entries.retain(|_, id| keep(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Composite patient key: `first|last|birthdate`, case-insensitive.
///
/// Returns `None` when the birthdate is unknown, since names alone collide too often.
pub fn patient_key(first_name: &str, last_name: &str, birthdate: Option<NaiveDate>) -> Option<String> {
    let birthdate = birthdate?;
    Some(format!(
        "{}|{}|{}",
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase(),
        birthdate.format("%Y-%m-%d")
    ))
}
