//! This module rebuilds the legacy-id lookups from what the target store
//! already holds.
//!
//! It runs before every phase, so a re-run maps each legacy row back onto the
//! UUID it received the first time and the upsert updates instead of duplicating.
use chrono::NaiveDate;
use legacy_migrator_repository::{TargetStore, TargetStoreError};
use legacy_migrator_shared::uuids::parse_valid_uuid;
use legacy_migrator_shared::{patient_key, EmailIndex, EntityKind, IdMap, PatientKeyIndex};
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

fn uuid_of(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(parse_valid_uuid)
}

/// Builds the legacy id -> UUID map for `kind`.
///
/// Rows with a missing legacy id or an unusable UUID are ignored. Kinds without
/// a legacy id column yield an empty map.
#[instrument(skip(store))]
pub async fn load_id_map(
    store: &dyn TargetStore,
    kind: EntityKind,
) -> Result<IdMap, TargetStoreError> {
    let mut map = IdMap::new(kind);
    let Some(legacy_column) = kind.legacy_id_column() else {
        return Ok(map);
    };

    let rows = store.select(kind.table(), &["id", legacy_column]).await?;
    map.extend(rows.iter().filter_map(|row| {
        let target_id = uuid_of(row.get("id")?)?;
        let legacy_id = row.get(legacy_column)?.as_i64()?;
        Some((legacy_id, target_id))
    }));

    debug!(entity = %kind, mapped = map.len(), "Reconciled identifiers");
    Ok(map)
}

/// Indexes existing profiles by email.
#[instrument(skip(store))]
pub async fn load_email_index(store: &dyn TargetStore) -> Result<EmailIndex, TargetStoreError> {
    let rows = store
        .select(
            EntityKind::Profile.table(),
            &["id", "email", "legacy_user_id"],
        )
        .await?;

    let mut index = EmailIndex::default();
    for row in &rows {
        let (Some(id), Some(email)) = (
            row.get("id").and_then(uuid_of),
            row.get("email").and_then(Value::as_str),
        ) else {
            continue;
        };
        let legacy_user_id = row.get("legacy_user_id").and_then(Value::as_i64);
        index.insert(email, id, legacy_user_id);
    }

    debug!(indexed = index.len(), "Reconciled profile emails");
    Ok(index)
}

/// Indexes existing patients by name and birthdate.
#[instrument(skip(store))]
pub async fn load_patient_keys(
    store: &dyn TargetStore,
) -> Result<PatientKeyIndex, TargetStoreError> {
    let rows = store
        .select(
            EntityKind::Patient.table(),
            &["id", "first_name", "last_name", "date_of_birth"],
        )
        .await?;

    let mut index = PatientKeyIndex::default();
    for row in &rows {
        let Some(id) = row.get("id").and_then(uuid_of) else {
            continue;
        };
        let first_name = row.get("first_name").and_then(Value::as_str).unwrap_or("");
        let last_name = row.get("last_name").and_then(Value::as_str).unwrap_or("");
        let date_of_birth = row
            .get("date_of_birth")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        if let Some(key) = patient_key(first_name, last_name, date_of_birth) {
            index.insert(key, id);
        }
    }

    debug!(indexed = index.len(), "Reconciled patient keys");
    Ok(index)
}
