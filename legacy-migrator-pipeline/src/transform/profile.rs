use chrono::{DateTime, Utc};
use legacy_migrator_shared::{
    EmailIndex, EntityKind, EntityQuality, IdMap, LegacyUser, Profile, ProfileRole,
};
use tracing::info;

use super::context::RecordContext;
use super::{SkipReason, TransformOutcome};

/// Lookups the profile transformer reads.
pub struct ProfileMaps<'a> {
    pub profiles: &'a IdMap,
    pub practices: &'a IdMap,
}

/// `auth_user` -> `profiles`.
///
/// `emails` is updated with every profile produced, so a second legacy user
/// sharing an email within the same run is skipped as a duplicate too.
pub fn transform_profile(
    user: &LegacyUser,
    maps: &ProfileMaps<'_>,
    emails: &mut EmailIndex,
    quality: &mut EntityQuality,
    now: DateTime<Utc>,
) -> TransformOutcome<Profile> {
    let email = user
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| e.contains('@'));

    if let Some(email) = &email {
        if let Some((existing, owner)) = emails.get(email) {
            if owner != Some(user.id) {
                info!(
                    legacy_user_id = user.id,
                    existing_profile = %existing,
                    "Skipping user with an email that already has a profile"
                );
                return TransformOutcome::Skipped(SkipReason::DuplicateEmail { existing });
            }
        }
    }

    let mut ctx = RecordContext::new(EntityKind::Profile, user.id, quality, now);

    let id = ctx.primary_key(maps.profiles.get(user.id), user.profile_uuid.as_deref());
    let email = ctx.required_text("email", email.as_deref(), || {
        format!("legacy-user-{}@invalid.local", user.id)
    });
    let first_name = user.first_name.as_deref().map(str::trim).unwrap_or("").to_string();
    let last_name = ctx.required_text("last_name", user.last_name.as_deref(), || {
        "Unknown".to_string()
    });
    let role = ctx.remap("role", ProfileRole::from_legacy(user.user_type, user.is_staff));
    let practice_id = ctx.optional_reference("practice_id", maps.practices, user.office_id);
    let created_at = ctx.timestamp("created_at", user.date_joined.as_deref());

    emails.insert(&email, id, Some(user.id));

    TransformOutcome::Ready(ctx.finish(Profile {
        id,
        legacy_user_id: user.id,
        email,
        first_name,
        last_name,
        role,
        practice_id,
        is_active: user.is_active.unwrap_or(true),
        created_at,
    }))
}
