use legacy_migrator_shared::{EntityKind, MissingReferencePolicy, ProjectMapping};

use crate::loader::LoaderConfig;

pub const DEFAULT_STATUS_ID: &str = "legacy_migration";

/// Which phases of a run execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSwitches {
    pub practices: bool,
    pub profiles: bool,
    pub practice_members: bool,
    pub patients: bool,
    pub cases: bool,
    pub case_files: bool,
    /// Only takes effect when an embedding generator is configured.
    pub embeddings: bool,
}

impl Default for PhaseSwitches {
    fn default() -> Self {
        Self {
            practices: true,
            profiles: true,
            practice_members: true,
            patients: true,
            cases: true,
            case_files: true,
            embeddings: true,
        }
    }
}

impl PhaseSwitches {
    /// Projects follow the cases switch.
    pub fn is_enabled(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Practice => self.practices,
            EntityKind::Profile => self.profiles,
            EntityKind::PracticeMember => self.practice_members,
            EntityKind::Patient => self.patients,
            EntityKind::Case | EntityKind::Project => self.cases,
            EntityKind::CaseFile => self.case_files,
            EntityKind::CaseEmbedding => self.embeddings,
        }
    }
}

/// Configuration for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub loader: LoaderConfig,
    pub missing_reference: MissingReferencePolicy,
    pub project_mapping: ProjectMapping,
    pub phases: PhaseSwitches,
    /// Key of the shared status row.
    pub status_id: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            missing_reference: MissingReferencePolicy::default(),
            project_mapping: ProjectMapping::default(),
            phases: PhaseSwitches::default(),
            status_id: DEFAULT_STATUS_ID.to_string(),
        }
    }
}
