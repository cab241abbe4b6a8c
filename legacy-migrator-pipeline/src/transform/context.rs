//! Per-record bookkeeping shared by every transformer.
use chrono::{DateTime, Utc};
use legacy_migrator_shared::uuids::parse_valid_uuid;
use legacy_migrator_shared::{EntityKind, EntityQuality, IdMap, Remap};
use std::fmt::Debug;
use tracing::{debug, warn};
use uuid::Uuid;

use super::time::parse_timestamp;
use super::{Transformed, UnresolvedReference};

/// Collects the recoveries and unresolved references of one legacy row while
/// it is being transformed.
pub struct RecordContext<'a> {
    kind: EntityKind,
    legacy_id: i64,
    quality: &'a mut EntityQuality,
    now: DateTime<Utc>,
    unresolved: Vec<UnresolvedReference>,
}

impl<'a> RecordContext<'a> {
    /// # Arguments
    ///
    /// * `kind` - Entity being produced.
    /// * `legacy_id` - Primary key of the legacy row, for diagnostics.
    /// * `quality` - Counters of `kind` to record recoveries in.
    /// * `now` - Fallback for missing or unparseable timestamps.
    pub fn new(
        kind: EntityKind,
        legacy_id: i64,
        quality: &'a mut EntityQuality,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            legacy_id,
            quality,
            now,
            unresolved: Vec::new(),
        }
    }

    pub fn legacy_id(&self) -> i64 {
        self.legacy_id
    }

    /// Picks the target primary key.
    ///
    /// An existing mapping wins so re-runs update in place; then a valid legacy
    /// UUID is kept; otherwise a fresh v4 is generated. A legacy UUID that is
    /// present but invalid is replaced and counted.
    pub fn primary_key(&mut self, existing: Option<Uuid>, legacy_uuid: Option<&str>) -> Uuid {
        if let Some(id) = existing {
            return id;
        }

        let Some(raw) = legacy_uuid.map(str::trim).filter(|s| !s.is_empty()) else {
            return Uuid::new_v4();
        };
        match parse_valid_uuid(raw) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                warn!(
                    entity = %self.kind,
                    legacy_id = self.legacy_id,
                    invalid_uuid = raw,
                    substitute = %id,
                    "Invalid legacy UUID replaced"
                );
                self.quality.substituted_ids += 1;
                id
            }
        }
    }

    /// Unwraps a remapped enum value, counting defaults and unknown codes.
    pub fn remap<T: Copy + Debug>(&mut self, field: &'static str, remap: Remap<T>) -> T {
        match &remap {
            Remap::Mapped(_) => {}
            Remap::Defaulted(value) => {
                debug!(entity = %self.kind, legacy_id = self.legacy_id, field, ?value, "Defaulted enum");
                self.quality.defaulted_fields += 1;
            }
            Remap::Unmapped { value, code } => {
                warn!(
                    entity = %self.kind,
                    legacy_id = self.legacy_id,
                    field,
                    code = code.as_str(),
                    fallback = ?value,
                    "Unknown legacy code"
                );
                self.quality.unmapped_codes += 1;
            }
        }
        remap.value()
    }

    /// Returns the trimmed text, or `default` when it is missing or blank.
    pub fn required_text(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        default: impl FnOnce() -> String,
    ) -> String {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => text.to_string(),
            None => {
                let text = default();
                debug!(entity = %self.kind, legacy_id = self.legacy_id, field, default = %text, "Defaulted field");
                self.quality.defaulted_fields += 1;
                text
            }
        }
    }

    /// Parses a legacy timestamp, falling back to the run start.
    pub fn timestamp(&mut self, field: &'static str, value: Option<&str>) -> DateTime<Utc> {
        if let Some(parsed) = value.and_then(parse_timestamp) {
            return parsed;
        }
        if let Some(raw) = value {
            warn!(entity = %self.kind, legacy_id = self.legacy_id, field, raw, "Unparseable timestamp");
        }
        self.quality.defaulted_fields += 1;
        self.now
    }

    /// Resolves a required foreign key; unresolved keys hold the nil UUID.
    pub fn required_reference(
        &mut self,
        column: &'static str,
        map: &IdMap,
        legacy_id: Option<i64>,
    ) -> Uuid {
        match map.resolve(legacy_id) {
            Some(id) => id,
            None => {
                self.unresolved.push(UnresolvedReference {
                    column,
                    target: map.kind(),
                    legacy_id,
                    required: true,
                });
                Uuid::nil()
            }
        }
    }

    /// Resolves an optional foreign key. An absent legacy value is simply null.
    pub fn optional_reference(
        &mut self,
        column: &'static str,
        map: &IdMap,
        legacy_id: Option<i64>,
    ) -> Option<Uuid> {
        let legacy = legacy_id?;
        let resolved = map.get(legacy);
        if resolved.is_none() {
            self.unresolved.push(UnresolvedReference {
                column,
                target: map.kind(),
                legacy_id: Some(legacy),
                required: false,
            });
        }
        resolved
    }

    pub fn finish<T>(self, row: T) -> Transformed<T> {
        Transformed {
            row,
            unresolved: self.unresolved,
        }
    }
}

/// Trims optional free text, turning blanks into `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_migrator_shared::CaseStatus;

    #[test]
    fn test_primary_key_resolution_order() {
        let mut quality = EntityQuality::default();
        let existing = Uuid::new_v4();
        let legacy = "a7ef0016-a2f4-44fb-82ca-a4f5c61d2cf5";
        let mut ctx = RecordContext::new(EntityKind::Case, 1, &mut quality, Utc::now());

        assert_eq!(ctx.primary_key(Some(existing), Some(legacy)), existing);
        assert_eq!(
            ctx.primary_key(None, Some(legacy)),
            Uuid::parse_str(legacy).unwrap()
        );
        let generated = ctx.primary_key(None, None);
        assert_eq!(generated.get_version_num(), 4);
        let _ = ctx.finish(());

        assert_eq!(quality.substituted_ids, 0);
    }

    #[test]
    fn test_invalid_legacy_uuid_is_substituted_and_counted() {
        let mut quality = EntityQuality::default();
        let mut ctx = RecordContext::new(EntityKind::Profile, 9, &mut quality, Utc::now());

        let id = ctx.primary_key(None, Some("not-a-uuid"));
        assert!(!id.is_nil());
        let _ = ctx.finish(());

        assert_eq!(quality.substituted_ids, 1);
    }

    #[test]
    fn test_remap_counts_recoveries() {
        let mut quality = EntityQuality::default();
        let mut ctx = RecordContext::new(EntityKind::Case, 1, &mut quality, Utc::now());

        assert_eq!(ctx.remap("status", CaseStatus::from_legacy(Some(2))), CaseStatus::InProgress);
        assert_eq!(ctx.remap("status", CaseStatus::from_legacy(None)), CaseStatus::Draft);
        assert_eq!(ctx.remap("status", CaseStatus::from_legacy(Some(42))), CaseStatus::Draft);
        let _ = ctx.finish(());

        assert_eq!(quality.defaulted_fields, 1);
        assert_eq!(quality.unmapped_codes, 1);
    }

    #[test]
    fn test_timestamp_falls_back_to_now() {
        let mut quality = EntityQuality::default();
        let now = Utc::now();
        let mut ctx = RecordContext::new(EntityKind::Practice, 1, &mut quality, now);

        assert_eq!(ctx.timestamp("created_at", Some("garbage")), now);
        assert_eq!(ctx.timestamp("created_at", None), now);
        assert_ne!(ctx.timestamp("created_at", Some("2020-01-01")), now);
        let _ = ctx.finish(());

        assert_eq!(quality.defaulted_fields, 2);
    }

    #[test]
    fn test_references() {
        let mut quality = EntityQuality::default();
        let mut practices = IdMap::new(EntityKind::Practice);
        let practice_id = Uuid::new_v4();
        practices.insert(1, practice_id);
        let profiles = IdMap::new(EntityKind::Profile);

        let mut ctx = RecordContext::new(EntityKind::Patient, 5, &mut quality, Utc::now());
        assert_eq!(ctx.required_reference("practice_id", &practices, Some(1)), practice_id);
        assert_eq!(ctx.required_reference("practice_id", &practices, None), Uuid::nil());
        assert_eq!(ctx.optional_reference("primary_doctor_id", &profiles, None), None);
        assert_eq!(ctx.optional_reference("primary_doctor_id", &profiles, Some(3)), None);

        let record = ctx.finish("row");
        assert_eq!(record.unresolved.len(), 2);
        assert!(record.unresolved[0].required);
        assert_eq!(record.unresolved[0].legacy_id, None);
        assert!(!record.unresolved[1].required);
        assert_eq!(record.unresolved[1].target, EntityKind::Profile);
    }
}
