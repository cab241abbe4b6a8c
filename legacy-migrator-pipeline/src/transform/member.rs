use chrono::{DateTime, Utc};
use legacy_migrator_shared::{
    EntityKind, EntityQuality, IdMap, LegacyMember, MemberRole, PracticeMember,
};

use super::context::RecordContext;
use super::TransformOutcome;

pub struct MemberMaps<'a> {
    pub members: &'a IdMap,
    pub practices: &'a IdMap,
    pub profiles: &'a IdMap,
}

/// `dispatch_office_members` -> `practice_members`.
pub fn transform_member(
    member: &LegacyMember,
    maps: &MemberMaps<'_>,
    quality: &mut EntityQuality,
    now: DateTime<Utc>,
) -> TransformOutcome<PracticeMember> {
    let mut ctx = RecordContext::new(EntityKind::PracticeMember, member.id, quality, now);

    let id = ctx.primary_key(maps.members.get(member.id), None);
    let practice_id = ctx.required_reference("practice_id", maps.practices, member.office_id);
    let profile_id = ctx.required_reference("profile_id", maps.profiles, member.user_id);
    let role = ctx.remap("role", MemberRole::from_legacy(member.role_code));
    let created_at = ctx.timestamp("created_at", member.created_at.as_deref());

    TransformOutcome::Ready(ctx.finish(PracticeMember {
        id,
        legacy_member_id: member.id,
        practice_id,
        profile_id,
        role,
        created_at,
    }))
}
