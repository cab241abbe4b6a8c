use chrono::{DateTime, Utc};
use legacy_migrator_shared::{
    CaseFile, EntityKind, EntityQuality, FileType, IdMap, LegacyProjectFile,
};
use tracing::info;

use super::context::RecordContext;
use super::{SkipReason, TransformOutcome};

pub struct CaseFileMaps<'a> {
    pub files: &'a IdMap,
    pub cases: &'a IdMap,
    pub profiles: &'a IdMap,
}

/// `dispatch_project_file` -> `case_files`.
///
/// A file without a URL has nothing to point at and is skipped.
pub fn transform_case_file(
    file: &LegacyProjectFile,
    maps: &CaseFileMaps<'_>,
    quality: &mut EntityQuality,
    now: DateTime<Utc>,
) -> TransformOutcome<CaseFile> {
    let Some(file_url) = file.file_url.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        info!(legacy_file_id = file.id, "Skipping file without a URL");
        return TransformOutcome::Skipped(SkipReason::MissingFileUrl);
    };

    let mut ctx = RecordContext::new(EntityKind::CaseFile, file.id, quality, now);

    let id = ctx.primary_key(maps.files.get(file.id), None);
    let case_id = ctx.required_reference("case_id", maps.cases, file.project_id);
    let uploaded_by = ctx.optional_reference("uploaded_by", maps.profiles, file.uploaded_by_id);
    let file_name = ctx.required_text("file_name", file.file_name.as_deref(), || {
        file_name_from_url(file_url).unwrap_or_else(|| format!("file-{}", file.id))
    });
    let file_type = ctx.remap(
        "file_type",
        FileType::from_legacy(file.file_type.as_deref(), Some(file_url)),
    );
    let created_at = ctx.timestamp("created_at", file.created_at.as_deref());

    TransformOutcome::Ready(ctx.finish(CaseFile {
        id,
        legacy_file_id: file.id,
        case_id,
        uploaded_by,
        file_name,
        file_url: file_url.to_string(),
        file_type,
        created_at,
    }))
}

/// Last path segment of `url`, without query string or fragment.
fn file_name_from_url(url: &str) -> Option<String> {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(str::to_string)
}
