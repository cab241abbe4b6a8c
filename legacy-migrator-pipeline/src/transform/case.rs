use chrono::{DateTime, Utc};
use legacy_migrator_shared::{
    Case, CaseStatus, CaseType, EntityKind, EntityQuality, IdMap, LegacyProject, Project,
    ProjectStatus,
};
use uuid::Uuid;

use super::context::{optional_text, RecordContext};
use super::TransformOutcome;

pub struct CaseMaps<'a> {
    pub cases: &'a IdMap,
    pub patients: &'a IdMap,
    pub practices: &'a IdMap,
    pub profiles: &'a IdMap,
}

/// `dispatch_project` -> `cases`.
///
/// The legacy project's own `uuid` column becomes the case id when it is valid.
pub fn transform_case(
    project: &LegacyProject,
    maps: &CaseMaps<'_>,
    quality: &mut EntityQuality,
    now: DateTime<Utc>,
) -> TransformOutcome<Case> {
    let mut ctx = RecordContext::new(EntityKind::Case, project.id, quality, now);

    let id = ctx.primary_key(maps.cases.get(project.id), project.uuid.as_deref());
    let patient_id = ctx.required_reference("patient_id", maps.patients, project.patient_id);
    let practice_id = ctx.required_reference("practice_id", maps.practices, project.office_id);
    let doctor_id = ctx.optional_reference("doctor_id", maps.profiles, project.doctor_id);
    let title = ctx.required_text("title", project.name.as_deref(), || {
        format!("Case #{}", project.id)
    });
    let case_type = ctx.remap("case_type", CaseType::from_legacy(project.project_type));
    let status = ctx.remap("status", CaseStatus::from_legacy(project.status));
    let created_at = ctx.timestamp("created_at", project.created_at.as_deref());
    let updated_at = match project.updated_at.as_deref() {
        Some(raw) => ctx.timestamp("updated_at", Some(raw)),
        None => created_at,
    };

    TransformOutcome::Ready(ctx.finish(Case {
        id,
        legacy_project_id: project.id,
        patient_id,
        practice_id,
        doctor_id,
        title,
        case_type,
        status,
        notes: optional_text(project.notes.as_deref()),
        created_at,
        updated_at,
    }))
}

/// Builds the `projects` row of a migrated case.
///
/// `existing` is the project already migrated for the same legacy project, if
/// any; the case it points at has already passed reference validation.
pub fn project_for_case(case: &Case, existing: Option<Uuid>) -> Project {
    Project {
        id: existing.unwrap_or_else(Uuid::new_v4),
        legacy_project_id: case.legacy_project_id,
        case_id: case.id,
        practice_id: case.practice_id,
        name: case.title.clone(),
        project_type: case.case_type,
        status: ProjectStatus::from(case.status),
        created_at: case.created_at,
        updated_at: case.updated_at,
    }
}
