//! Row shapes of the legacy practice database.
//!
//! Rows arrive as JSON objects (one per row) and are deserialized leniently:
//! everything except the integer primary key may be missing or null.
use serde::Deserialize;

/// `dispatch_office`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyOffice {
    pub id: i64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
}

/// `auth_user`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyUser {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: Option<i64>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
    pub office_id: Option<i64>,
    /// Free-text identifier some users received from the old auth service.
    pub profile_uuid: Option<String>,
    pub date_joined: Option<String>,
}

/// `dispatch_office_members`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyMember {
    pub id: i64,
    pub office_id: Option<i64>,
    pub user_id: Option<i64>,
    pub role_code: Option<i64>,
    pub created_at: Option<String>,
}

/// `dispatch_patient`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyPatient {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthdate: Option<String>,
    pub sex: Option<String>,
    pub office_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub archived: Option<bool>,
    pub created_at: Option<String>,
}

/// `dispatch_project`
///
/// Projects, not orders, carry the bulk of the legacy volume; each one becomes a
/// case (and, depending on the project mapping, a project) in the target.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyProject {
    pub id: i64,
    pub uuid: Option<String>,
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub office_id: Option<i64>,
    pub name: Option<String>,
    pub project_type: Option<i64>,
    pub status: Option<i64>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// `dispatch_project_file`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyProjectFile {
    pub id: i64,
    pub project_id: Option<i64>,
    pub uploaded_by_id: Option<i64>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_null_columns_deserialize_as_none() {
        let row = json!({ "id": 12, "name": null, "project_type": 3 });
        let project: LegacyProject = serde_json::from_value(row).unwrap();

        assert_eq!(project.id, 12);
        assert_eq!(project.name, None);
        assert_eq!(project.project_type, Some(3));
        assert_eq!(project.uuid, None);
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let row = json!({ "id": 1, "email": "a@b.c", "password": "hash" });
        let user: LegacyUser = serde_json::from_value(row).unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
    }
}
