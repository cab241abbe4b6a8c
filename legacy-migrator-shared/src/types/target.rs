//! Row shapes written to the target store.
//!
//! Field names match the target column names; rows are serialized to JSON and
//! handed to the store as-is.
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::{
    CaseStatus, CaseType, EntityKind, FileType, MemberRole, PatientSex, PatientStatus,
    PracticeStatus, ProfileRole, ProjectStatus,
};

/// A row destined for one target table.
pub trait TargetRow: Serialize + Send + Sync {
    const KIND: EntityKind;

    /// Conflict target of the upsert.
    const PRIMARY_KEY: &'static str = "id";

    fn primary_key(&self) -> Uuid;

    /// Legacy id the row was migrated from, used in diagnostics.
    fn legacy_id(&self) -> Option<i64>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Practice {
    pub id: Uuid,
    pub legacy_office_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: PracticeStatus,
    pub created_at: DateTime<Utc>,
}

impl TargetRow for Practice {
    const KIND: EntityKind = EntityKind::Practice;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_office_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub legacy_user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: ProfileRole,
    pub practice_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TargetRow for Profile {
    const KIND: EntityKind = EntityKind::Profile;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeMember {
    pub id: Uuid,
    pub legacy_member_id: i64,
    pub practice_id: Uuid,
    pub profile_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

impl TargetRow for PracticeMember {
    const KIND: EntityKind = EntityKind::PracticeMember;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_member_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub legacy_patient_id: i64,
    pub practice_id: Uuid,
    pub primary_doctor_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: PatientSex,
    pub status: PatientStatus,
    pub created_at: DateTime<Utc>,
}

impl TargetRow for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_patient_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    pub id: Uuid,
    pub legacy_project_id: i64,
    pub patient_id: Uuid,
    pub practice_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub title: String,
    pub case_type: CaseType,
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TargetRow for Case {
    const KIND: EntityKind = EntityKind::Case;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_project_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub legacy_project_id: i64,
    pub case_id: Uuid,
    pub practice_id: Uuid,
    pub name: String,
    pub project_type: CaseType,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TargetRow for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_project_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseFile {
    pub id: Uuid,
    pub legacy_file_id: i64,
    pub case_id: Uuid,
    pub uploaded_by: Option<Uuid>,
    pub file_name: String,
    pub file_url: String,
    pub file_type: FileType,
    pub created_at: DateTime<Utc>,
}

impl TargetRow for CaseFile {
    const KIND: EntityKind = EntityKind::CaseFile;

    fn primary_key(&self) -> Uuid {
        self.id
    }

    fn legacy_id(&self) -> Option<i64> {
        Some(self.legacy_file_id)
    }
}

/// Embedding of a migrated case, keyed by the case it describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseEmbedding {
    pub case_id: Uuid,
    pub content: String,
    pub embedding: Vec<f32>,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl TargetRow for CaseEmbedding {
    const KIND: EntityKind = EntityKind::CaseEmbedding;
    const PRIMARY_KEY: &'static str = "case_id";

    fn primary_key(&self) -> Uuid {
        self.case_id
    }

    fn legacy_id(&self) -> Option<i64> {
        None
    }
}
