//! Target enums and the tables that remap legacy codes onto them.
//!
//! Every remapping is total: an absent code yields the documented default and an
//! unknown code yields the documented fallback, so a target row never carries an
//! undefined enum value.
use serde::{Deserialize, Serialize};

/// Outcome of remapping one legacy code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remap<T> {
    /// The code was recognised.
    Mapped(T),
    /// The legacy value was absent; the default was used.
    Defaulted(T),
    /// The legacy value was present but unknown; the fallback was used.
    Unmapped { value: T, code: String },
}

impl<T: Copy> Remap<T> {
    pub fn value(&self) -> T {
        match self {
            Remap::Mapped(value) | Remap::Defaulted(value) => *value,
            Remap::Unmapped { value, .. } => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeStatus {
    Active,
    Inactive,
}

impl PracticeStatus {
    pub fn from_legacy(is_active: Option<bool>) -> Remap<Self> {
        match is_active {
            Some(true) => Remap::Mapped(Self::Active),
            Some(false) => Remap::Mapped(Self::Inactive),
            None => Remap::Defaulted(Self::Active),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Doctor,
    Technician,
    Staff,
    Admin,
}

impl ProfileRole {
    /// `auth_user.user_type`, with `is_staff` promoting the user to admin.
    pub fn from_legacy(user_type: Option<i64>, is_staff: Option<bool>) -> Remap<Self> {
        if is_staff == Some(true) {
            return Remap::Mapped(Self::Admin);
        }
        match user_type {
            Some(1) => Remap::Mapped(Self::Doctor),
            Some(2) => Remap::Mapped(Self::Technician),
            Some(3) => Remap::Mapped(Self::Staff),
            Some(4) => Remap::Mapped(Self::Admin),
            Some(code) => Remap::Unmapped {
                value: Self::Staff,
                code: code.to_string(),
            },
            None => Remap::Defaulted(Self::Staff),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Doctor,
    Staff,
}

impl MemberRole {
    pub fn from_legacy(role_code: Option<i64>) -> Remap<Self> {
        match role_code {
            Some(1) => Remap::Mapped(Self::Owner),
            Some(2) => Remap::Mapped(Self::Doctor),
            Some(3) => Remap::Mapped(Self::Staff),
            Some(code) => Remap::Unmapped {
                value: Self::Staff,
                code: code.to_string(),
            },
            None => Remap::Defaulted(Self::Staff),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientSex {
    Male,
    Female,
    Other,
    Unknown,
}

impl PatientSex {
    pub fn from_legacy(sex: Option<&str>) -> Remap<Self> {
        let Some(raw) = sex.map(str::trim).filter(|s| !s.is_empty()) else {
            return Remap::Defaulted(Self::Unknown);
        };
        match raw.to_ascii_lowercase().as_str() {
            "m" | "male" => Remap::Mapped(Self::Male),
            "f" | "female" => Remap::Mapped(Self::Female),
            "o" | "other" => Remap::Mapped(Self::Other),
            "u" | "unknown" => Remap::Mapped(Self::Unknown),
            _ => Remap::Unmapped {
                value: Self::Unknown,
                code: raw.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Active,
    Archived,
}

impl PatientStatus {
    pub fn from_legacy(archived: Option<bool>) -> Remap<Self> {
        match archived {
            Some(true) => Remap::Mapped(Self::Archived),
            Some(false) => Remap::Mapped(Self::Active),
            None => Remap::Defaulted(Self::Active),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Aligner,
    Retainer,
    Crown,
    Bridge,
    Implant,
    Denture,
    Other,
}

impl CaseType {
    pub fn from_legacy(project_type: Option<i64>) -> Remap<Self> {
        match project_type {
            Some(1) => Remap::Mapped(Self::Aligner),
            Some(2) => Remap::Mapped(Self::Retainer),
            Some(3) => Remap::Mapped(Self::Crown),
            Some(4) => Remap::Mapped(Self::Bridge),
            Some(5) => Remap::Mapped(Self::Implant),
            Some(6) => Remap::Mapped(Self::Denture),
            Some(code) => Remap::Unmapped {
                value: Self::Other,
                code: code.to_string(),
            },
            None => Remap::Defaulted(Self::Other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Draft,
    Submitted,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl CaseStatus {
    pub fn from_legacy(status: Option<i64>) -> Remap<Self> {
        match status {
            Some(0) => Remap::Mapped(Self::Draft),
            Some(1) => Remap::Mapped(Self::Submitted),
            Some(2) => Remap::Mapped(Self::InProgress),
            Some(3) => Remap::Mapped(Self::OnHold),
            Some(4) => Remap::Mapped(Self::Completed),
            Some(5) => Remap::Mapped(Self::Cancelled),
            Some(code) => Remap::Unmapped {
                value: Self::Draft,
                code: code.to_string(),
            },
            None => Remap::Defaulted(Self::Draft),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl From<CaseStatus> for ProjectStatus {
    fn from(status: CaseStatus) -> Self {
        match status {
            CaseStatus::Draft | CaseStatus::Submitted => ProjectStatus::Pending,
            CaseStatus::InProgress | CaseStatus::OnHold => ProjectStatus::Active,
            CaseStatus::Completed => ProjectStatus::Completed,
            CaseStatus::Cancelled => ProjectStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Scan,
    Photo,
    Xray,
    Document,
    Other,
}

impl FileType {
    /// Uses the explicit `file_type` column, falling back to the URL extension.
    pub fn from_legacy(file_type: Option<&str>, file_url: Option<&str>) -> Remap<Self> {
        let explicit = file_type.map(str::trim).filter(|s| !s.is_empty());
        let extension = file_url
            .and_then(|url| url.split(['?', '#']).next())
            .and_then(|path| path.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && !ext.contains('/'));

        let Some(raw) = explicit.or(extension) else {
            return Remap::Defaulted(Self::Other);
        };
        match Self::classify(&raw.to_ascii_lowercase()) {
            Some(kind) => Remap::Mapped(kind),
            None => Remap::Unmapped {
                value: Self::Other,
                code: raw.to_string(),
            },
        }
    }

    fn classify(code: &str) -> Option<Self> {
        match code {
            "scan" | "stl" | "ply" | "obj" => Some(Self::Scan),
            "photo" | "jpg" | "jpeg" | "png" | "heic" => Some(Self::Photo),
            "xray" | "x-ray" | "dcm" | "dicom" => Some(Self::Xray),
            "document" | "pdf" | "doc" | "docx" | "txt" => Some(Self::Document),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}
