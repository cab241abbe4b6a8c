use chrono::{DateTime, Utc};
use legacy_migrator_shared::{EntityKind, EntityQuality, IdMap, LegacyOffice, Practice, PracticeStatus};

use super::context::{optional_text, RecordContext};
use super::TransformOutcome;

/// `dispatch_office` -> `practices`.
pub fn transform_practice(
    office: &LegacyOffice,
    practices: &IdMap,
    quality: &mut EntityQuality,
    now: DateTime<Utc>,
) -> TransformOutcome<Practice> {
    let mut ctx = RecordContext::new(EntityKind::Practice, office.id, quality, now);

    let id = ctx.primary_key(practices.get(office.id), None);
    let name = ctx.required_text("name", office.name.as_deref(), || {
        format!("Practice #{}", office.id)
    });
    let status = ctx.remap("status", PracticeStatus::from_legacy(office.is_active));
    let created_at = ctx.timestamp("created_at", office.created_at.as_deref());

    TransformOutcome::Ready(ctx.finish(Practice {
        id,
        legacy_office_id: office.id,
        name,
        address: optional_text(office.address.as_deref()),
        phone: optional_text(office.phone.as_deref()),
        email: optional_text(office.email.as_deref()).map(|email| email.to_lowercase()),
        status,
        created_at,
    }))
}
