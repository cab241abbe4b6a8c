use chrono::{DateTime, Utc};
use legacy_migrator_shared::{
    patient_key, EntityKind, EntityQuality, IdMap, LegacyPatient, Patient, PatientKeyIndex,
    PatientSex, PatientStatus,
};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

use super::context::RecordContext;
use super::time::parse_date;
use super::{SkipReason, TransformOutcome};

/// Decides which target patient a legacy patient lands on.
///
/// Holds the reconciled maps plus the patients claimed so far in this run, so
/// two legacy rows for the same person never write the same target row twice.
pub struct PatientResolver<'a> {
    patients: &'a IdMap,
    practices: &'a IdMap,
    profiles: &'a IdMap,
    keys: PatientKeyIndex,
    /// Target patient -> legacy patient that owns it.
    owners: HashMap<Uuid, i64>,
}

impl<'a> PatientResolver<'a> {
    pub fn new(
        patients: &'a IdMap,
        practices: &'a IdMap,
        profiles: &'a IdMap,
        keys: PatientKeyIndex,
    ) -> Self {
        let owners = patients.iter().map(|(legacy, target)| (target, legacy)).collect();
        Self {
            patients,
            practices,
            profiles,
            keys,
            owners,
        }
    }

    /// Patients the reconciled maps place in the target before this run writes anything.
    pub fn known_ids(&self) -> HashSet<Uuid> {
        self.patients
            .iter()
            .map(|(_, id)| id)
            .chain(self.keys.patient_ids())
            .collect()
    }

    /// Drops every claim on a patient `keep` rejects.
    ///
    /// Legacy rows skipped as duplicates of a released patient can then be
    /// transformed again and claim the key themselves.
    pub fn release_claims(&mut self, keep: impl Fn(&Uuid) -> bool) {
        self.owners.retain(|id, _| keep(id));
        self.keys.retain(|id| keep(id));
    }
}

/// `dispatch_patient` -> `patients`.
///
/// A patient already migrated under its legacy id keeps its UUID. Otherwise a
/// target patient with the same name and birthdate is reused, unless another
/// legacy patient owns it, in which case the row is skipped as a duplicate.
pub fn transform_patient(
    patient: &LegacyPatient,
    resolver: &mut PatientResolver<'_>,
    quality: &mut EntityQuality,
    now: DateTime<Utc>,
) -> TransformOutcome<Patient> {
    let first_name = patient.first_name.as_deref().map(str::trim).unwrap_or("").to_string();
    let raw_last_name = patient.last_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let date_of_birth = patient.birthdate.as_deref().and_then(parse_date);
    if date_of_birth.is_none() {
        if let Some(raw) = patient.birthdate.as_deref() {
            warn!(legacy_patient_id = patient.id, raw, "Unparseable birthdate dropped");
        }
    }

    let key = raw_last_name.and_then(|last| patient_key(&first_name, last, date_of_birth));
    let by_key = key.as_deref().and_then(|k| resolver.keys.get(k));
    let existing = resolver.patients.get(patient.id);

    if existing.is_none() {
        if let Some(matched) = by_key {
            if let Some(owner) = resolver.owners.get(&matched) {
                if *owner != patient.id {
                    info!(
                        legacy_patient_id = patient.id,
                        duplicate_of = owner,
                        existing_patient = %matched,
                        "Skipping duplicate patient"
                    );
                    return TransformOutcome::Skipped(SkipReason::DuplicatePatient {
                        existing: matched,
                    });
                }
            }
        }
    }

    let mut ctx = RecordContext::new(EntityKind::Patient, patient.id, quality, now);

    let id = ctx.primary_key(existing.or(by_key), None);
    let last_name = ctx.required_text("last_name", raw_last_name, || "Unknown".to_string());
    let practice_id = ctx.required_reference("practice_id", resolver.practices, patient.office_id);
    let primary_doctor_id =
        ctx.optional_reference("primary_doctor_id", resolver.profiles, patient.doctor_id);
    let sex = ctx.remap("sex", PatientSex::from_legacy(patient.sex.as_deref()));
    let status = ctx.remap("status", PatientStatus::from_legacy(patient.archived));
    let created_at = ctx.timestamp("created_at", patient.created_at.as_deref());

    resolver.owners.insert(id, patient.id);
    if let Some(key) = key {
        resolver.keys.insert(key, id);
    }

    TransformOutcome::Ready(ctx.finish(Patient {
        id,
        legacy_patient_id: patient.id,
        practice_id,
        primary_doctor_id,
        first_name,
        last_name,
        date_of_birth,
        sex,
        status,
        created_at,
    }))
}
