use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind of record the migrator writes, in the order phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Practice,
    Profile,
    PracticeMember,
    Patient,
    Case,
    Project,
    CaseFile,
    CaseEmbedding,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Practice,
        EntityKind::Profile,
        EntityKind::PracticeMember,
        EntityKind::Patient,
        EntityKind::Case,
        EntityKind::Project,
        EntityKind::CaseFile,
        EntityKind::CaseEmbedding,
    ];

    /// Target table the records of this kind are written to.
    pub const fn table(self) -> &'static str {
        match self {
            EntityKind::Practice => "practices",
            EntityKind::Profile => "profiles",
            EntityKind::PracticeMember => "practice_members",
            EntityKind::Patient => "patients",
            EntityKind::Case => "cases",
            EntityKind::Project => "projects",
            EntityKind::CaseFile => "case_files",
            EntityKind::CaseEmbedding => "case_embeddings",
        }
    }

    /// Column of the target table holding the legacy integer id, if the kind has one.
    pub const fn legacy_id_column(self) -> Option<&'static str> {
        match self {
            EntityKind::Practice => Some("legacy_office_id"),
            EntityKind::Profile => Some("legacy_user_id"),
            EntityKind::PracticeMember => Some("legacy_member_id"),
            EntityKind::Patient => Some("legacy_patient_id"),
            EntityKind::Case | EntityKind::Project => Some("legacy_project_id"),
            EntityKind::CaseFile => Some("legacy_file_id"),
            EntityKind::CaseEmbedding => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Practice => "practice",
            EntityKind::Profile => "profile",
            EntityKind::PracticeMember => "practice_member",
            EntityKind::Patient => "patient",
            EntityKind::Case => "case",
            EntityKind::Project => "project",
            EntityKind::CaseFile => "case_file",
            EntityKind::CaseEmbedding => "case_embedding",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
