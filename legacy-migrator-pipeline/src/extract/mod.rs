//! This module reads the legacy tables and decodes each row into its typed
//! shape.
//!
//! Every query is ordered by primary key so batches, logs and status reports
//! line up across re-runs.
use legacy_migrator_repository::{LegacySource, LegacySourceError};
use legacy_migrator_shared::{
    LegacyMember, LegacyOffice, LegacyPatient, LegacyProject, LegacyProjectFile, LegacyUser,
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::errors::TransformError;

pub const OFFICES_SQL: &str = "SELECT id, name, address, phone, email, is_active, created_at \
     FROM dispatch_office ORDER BY id";

pub const USERS_SQL: &str = "SELECT id, email, first_name, last_name, user_type, is_staff, \
     is_active, office_id, profile_uuid, date_joined \
     FROM auth_user ORDER BY id";

pub const MEMBERS_SQL: &str = "SELECT id, office_id, user_id, role_code, created_at \
     FROM dispatch_office_members ORDER BY id";

pub const PATIENTS_SQL: &str = "SELECT id, first_name, last_name, birthdate, sex, office_id, \
     doctor_id, archived, created_at \
     FROM dispatch_patient ORDER BY id";

pub const PROJECTS_SQL: &str = "SELECT id, uuid, patient_id, doctor_id, office_id, name, \
     project_type, status, notes, created_at, updated_at \
     FROM dispatch_project ORDER BY id";

pub const PROJECT_FILES_SQL: &str = "SELECT id, project_id, uploaded_by_id, file_name, file_url, \
     file_type, created_at \
     FROM dispatch_project_file ORDER BY id";

/// Rows read from one legacy table.
#[derive(Debug)]
pub struct Extracted<T> {
    pub rows: Vec<T>,
    /// Rows that could not be decoded; they are skipped, not fatal.
    pub malformed: Vec<TransformError>,
}

impl<T> Extracted<T> {
    /// Number of legacy rows read, decodable or not.
    pub fn total(&self) -> u64 {
        (self.rows.len() + self.malformed.len()) as u64
    }
}

/// Reads the legacy tables through a [`LegacySource`].
pub struct Extractor<'a> {
    source: &'a dyn LegacySource,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a dyn LegacySource) -> Self {
        Self { source }
    }

    pub async fn offices(&self) -> Result<Extracted<LegacyOffice>, LegacySourceError> {
        self.extract("dispatch_office", OFFICES_SQL).await
    }

    pub async fn users(&self) -> Result<Extracted<LegacyUser>, LegacySourceError> {
        self.extract("auth_user", USERS_SQL).await
    }

    pub async fn members(&self) -> Result<Extracted<LegacyMember>, LegacySourceError> {
        self.extract("dispatch_office_members", MEMBERS_SQL).await
    }

    pub async fn patients(&self) -> Result<Extracted<LegacyPatient>, LegacySourceError> {
        self.extract("dispatch_patient", PATIENTS_SQL).await
    }

    pub async fn projects(&self) -> Result<Extracted<LegacyProject>, LegacySourceError> {
        self.extract("dispatch_project", PROJECTS_SQL).await
    }

    pub async fn project_files(&self) -> Result<Extracted<LegacyProjectFile>, LegacySourceError> {
        self.extract("dispatch_project_file", PROJECT_FILES_SQL).await
    }

    async fn extract<T: DeserializeOwned>(
        &self,
        table: &'static str,
        sql: &str,
    ) -> Result<Extracted<T>, LegacySourceError> {
        let rows = self.source.query(sql).await?;
        let extracted = decode_rows(table, rows);
        info!(
            table,
            rows = extracted.rows.len(),
            malformed = extracted.malformed.len(),
            "Extracted legacy rows"
        );
        Ok(extracted)
    }
}

/// Decodes JSON rows, setting aside the ones that do not fit `T`.
pub fn decode_rows<T: DeserializeOwned>(
    table: &'static str,
    rows: Vec<serde_json::Value>,
) -> Extracted<T> {
    let mut decoded = Vec::with_capacity(rows.len());
    let mut malformed = Vec::new();

    for row in rows {
        let id = row.get("id").and_then(serde_json::Value::as_i64);
        match serde_json::from_value::<T>(row) {
            Ok(value) => decoded.push(value),
            Err(source) => {
                warn!(table, id = ?id, error = %source, "Skipping malformed legacy row");
                malformed.push(TransformError::MalformedRow { table, id, source });
            }
        }
    }

    Extracted {
        rows: decoded,
        malformed,
    }
}
