mod entity_kind;
mod enums;
mod id_map;
mod legacy;
mod policy;
mod report;
mod run;
mod target;

pub use entity_kind::EntityKind;
pub use enums::{
    CaseStatus, CaseType, FileType, MemberRole, PatientSex, PatientStatus, PracticeStatus,
    ProfileRole, ProjectStatus, Remap,
};
pub use id_map::{patient_key, EmailIndex, IdMap, PatientKeyIndex};
pub use legacy::{
    LegacyMember, LegacyOffice, LegacyPatient, LegacyProject, LegacyProjectFile, LegacyUser,
};
pub use policy::{ConflictPolicy, MissingReferencePolicy, ParsePolicyError, ProjectMapping};
pub use report::{
    BatchOutcome, DataQualityReport, EntityQuality, EntityReport, LoadReport, RunSummary,
};
pub use run::{InvalidTransition, MigrationRun, RunState, StatusSnapshot};
pub use target::{
    Case, CaseEmbedding, CaseFile, Patient, Practice, PracticeMember, Profile, Project, TargetRow,
};
