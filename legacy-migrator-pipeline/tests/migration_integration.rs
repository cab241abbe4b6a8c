//! Integration tests for the migration orchestrator.
//!
//! These run the real Migrator against in-memory stores seeded with a small
//! legacy practice.

mod common;

use common::{InjectedFailure, MemoryTargetStore, MockLegacySource, RecordingStatusStore};
use legacy_migrator_pipeline::embeddings::{EmbeddingGenerator, MockEmbeddingProvider};
use legacy_migrator_pipeline::errors::MigrationError;
use legacy_migrator_pipeline::extract::{
    MEMBERS_SQL, OFFICES_SQL, PATIENTS_SQL, PROJECTS_SQL, PROJECT_FILES_SQL, USERS_SQL,
};
use legacy_migrator_pipeline::loader::{LoaderConfig, RetryConfig};
use legacy_migrator_pipeline::orchestrator::{MigrationConfig, Migrator, PhaseSwitches};
use legacy_migrator_shared::uuids::parse_valid_uuid;
use legacy_migrator_shared::{
    EntityKind, MissingReferencePolicy, ProjectMapping, RunState, RunSummary,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const DOCTOR_UUID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";
const PROJECT_UUID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

fn legacy_practice() -> MockLegacySource {
    MockLegacySource::new()
        .with_rows(
            OFFICES_SQL,
            vec![
                json!({"id": 1, "name": "North Dental", "is_active": true, "created_at": "2019-01-01T00:00:00"}),
                json!({"id": 2, "name": null, "is_active": false, "created_at": "2019-02-01T00:00:00"}),
            ],
        )
        .with_rows(
            USERS_SQL,
            vec![
                json!({"id": 10, "email": "doc@north.example", "first_name": "Dana", "last_name": "Smith",
                       "user_type": 1, "is_staff": false, "is_active": true, "office_id": 1,
                       "profile_uuid": DOCTOR_UUID, "date_joined": "2019-01-02T00:00:00"}),
                json!({"id": 11, "email": "staff@north.example", "first_name": "Sam", "last_name": null,
                       "user_type": 3, "office_id": 1, "profile_uuid": "not-a-uuid",
                       "date_joined": "2019-01-03T00:00:00"}),
                json!({"id": 12, "email": "DOC@north.example", "first_name": "Dup", "last_name": "Licate",
                       "user_type": 1, "office_id": 1, "date_joined": "2019-01-04T00:00:00"}),
            ],
        )
        .with_rows(
            MEMBERS_SQL,
            vec![
                json!({"id": 100, "office_id": 1, "user_id": 10, "role_code": 1, "created_at": "2019-01-05T00:00:00"}),
                json!({"id": 101, "office_id": 1, "user_id": 99, "role_code": 3, "created_at": "2019-01-05T00:00:00"}),
            ],
        )
        .with_rows(
            PATIENTS_SQL,
            vec![
                json!({"id": 200, "first_name": "Ada", "last_name": "Lovelace", "birthdate": "1985-12-10",
                       "sex": "f", "office_id": 1, "doctor_id": 10, "archived": false,
                       "created_at": "2020-01-01T00:00:00"}),
                json!({"id": 201, "first_name": "Alan", "last_name": "Turing", "birthdate": "1982-06-23",
                       "sex": "M", "office_id": 2, "archived": true, "created_at": "2020-01-02T00:00:00"}),
                json!({"id": 202, "first_name": "ADA", "last_name": "lovelace", "birthdate": "1985-12-10",
                       "sex": "f", "office_id": 1, "created_at": "2020-01-03T00:00:00"}),
            ],
        )
        .with_rows(
            PROJECTS_SQL,
            vec![
                json!({"id": 300, "uuid": PROJECT_UUID, "patient_id": 200, "doctor_id": 10, "office_id": 1,
                       "name": "Upper aligners", "project_type": 1, "status": 2, "notes": "Phase 1",
                       "created_at": "2021-03-01T10:00:00", "updated_at": "2021-03-02T10:00:00"}),
                json!({"id": 301, "uuid": null, "patient_id": 202, "office_id": 1, "name": null,
                       "project_type": 3, "status": 4, "created_at": "2021-04-01T10:00:00"}),
                json!({"id": 302, "uuid": null, "patient_id": 999, "office_id": 1, "name": "Orphan",
                       "project_type": 2, "status": 1, "created_at": "2021-05-01T10:00:00"}),
            ],
        )
        .with_rows(
            PROJECT_FILES_SQL,
            vec![
                json!({"id": 400, "project_id": 300, "uploaded_by_id": 10, "file_name": null,
                       "file_url": "https://cdn.example.com/300/upper.stl", "file_type": null,
                       "created_at": "2021-03-01T11:00:00"}),
                json!({"id": 401, "project_id": 300, "file_url": null, "created_at": "2021-03-01T11:00:00"}),
                json!({"id": 402, "project_id": 302, "file_url": "https://cdn.example.com/302/photo.jpg",
                       "created_at": "2021-05-01T11:00:00"}),
            ],
        )
}

fn config() -> MigrationConfig {
    MigrationConfig {
        loader: LoaderConfig {
            batch_size: 2,
            retry: RetryConfig {
                max_retries: 1,
                base_delay_ms: 1,
                max_delay_ms: 2,
            },
            ..LoaderConfig::default()
        },
        ..MigrationConfig::default()
    }
}

async fn migrate(
    legacy: Arc<MockLegacySource>,
    target: Arc<MemoryTargetStore>,
    status: Arc<RecordingStatusStore>,
    config: MigrationConfig,
) -> Result<RunSummary, MigrationError> {
    Migrator::new(legacy, target, status, config).run().await
}

fn find<'a>(rows: &'a [Value], column: &str, legacy_id: i64) -> &'a Value {
    rows.iter()
        .find(|row| row[column] == json!(legacy_id))
        .unwrap_or_else(|| panic!("no row with {column} = {legacy_id}"))
}

/// One office and no users; only patients and their projects vary.
fn patients_practice(patients: Vec<Value>, projects: Vec<Value>) -> MockLegacySource {
    MockLegacySource::new()
        .with_rows(OFFICES_SQL, vec![json!({"id": 1, "name": "North Dental"})])
        .with_rows(PATIENTS_SQL, patients)
        .with_rows(PROJECTS_SQL, projects)
}

fn ada(id: i64, office_id: i64) -> Value {
    json!({"id": id, "first_name": "Ada", "last_name": "Lovelace", "birthdate": "1985-12-10",
           "office_id": office_id})
}

fn project(id: i64, patient_id: i64) -> Value {
    json!({"id": id, "patient_id": patient_id, "office_id": 1, "project_type": 1, "status": 1})
}

fn assert_no_dangling_patients(target: &MemoryTargetStore) {
    let patients: HashSet<String> = ids(&target.rows("patients")).into_iter().collect();
    for case in target.rows("cases") {
        let patient_id = case["patient_id"].as_str().unwrap();
        assert!(patients.contains(patient_id), "dangling case {case}");
    }
}

fn ids(rows: &[Value]) -> Vec<String> {
    let mut ids: Vec<String> = rows
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_full_migration() {
    let legacy = Arc::new(legacy_practice());
    let target = Arc::new(MemoryTargetStore::new());
    let status = Arc::new(RecordingStatusStore::new());

    let summary = migrate(legacy.clone(), target.clone(), status.clone(), config())
        .await
        .unwrap();

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(target.count("practices"), 2);
    assert_eq!(target.count("profiles"), 2);
    assert_eq!(target.count("practice_members"), 1);
    assert_eq!(target.count("patients"), 2);
    assert_eq!(target.count("cases"), 2);
    assert_eq!(target.count("projects"), 2);
    assert_eq!(target.count("case_files"), 1);
    assert!(legacy.is_closed());

    let profile = summary.report(EntityKind::Profile).unwrap();
    assert_eq!(profile.extracted, 3);
    assert_eq!(profile.skipped, 1);
    assert_eq!(profile.skip_reasons.get("duplicate_email"), Some(&1));

    assert_eq!(summary.report(EntityKind::PracticeMember).unwrap().rejected, 1);
    assert_eq!(
        summary.report(EntityKind::Patient).unwrap().skip_reasons.get("duplicate_patient"),
        Some(&1)
    );
    assert_eq!(summary.report(EntityKind::Case).unwrap().rejected, 1);

    let files = summary.report(EntityKind::CaseFile).unwrap();
    assert_eq!(files.skipped, 1);
    assert_eq!(files.rejected, 1);

    let quality = &summary.data_quality;
    assert_eq!(quality.get(EntityKind::Profile).substituted_ids, 1);
    assert_eq!(quality.get(EntityKind::Case).rejected_references, 1);
    assert_eq!(quality.total_substituted_ids(), 1);

    assert_eq!(status.finished.lock().unwrap().len(), 1);
    let last = status.last_snapshot().unwrap();
    assert_eq!(last.state, RunState::Completed);
    assert_eq!(last.details["run_id"], json!(summary.run_id.to_string()));
}

#[tokio::test]
async fn test_foreign_keys_point_at_mapped_uuids() {
    let legacy = Arc::new(legacy_practice());
    let target = Arc::new(MemoryTargetStore::new());
    let status = Arc::new(RecordingStatusStore::new());

    migrate(legacy, target.clone(), status, config()).await.unwrap();

    let practices = target.rows("practices");
    let profiles = target.rows("profiles");
    let patients = target.rows("patients");
    let cases = target.rows("cases");

    let north = &find(&practices, "legacy_office_id", 1)["id"];
    let doctor = &find(&profiles, "legacy_user_id", 10)["id"];
    let ada = &find(&patients, "legacy_patient_id", 200)["id"];

    assert_eq!(doctor, &json!(DOCTOR_UUID));
    assert_eq!(&find(&profiles, "legacy_user_id", 10)["practice_id"], north);

    let aligners = find(&cases, "legacy_project_id", 300);
    assert_eq!(aligners["id"], json!(PROJECT_UUID));
    assert_eq!(&aligners["patient_id"], ada);
    assert_eq!(&aligners["practice_id"], north);
    assert_eq!(&aligners["doctor_id"], doctor);

    // the duplicate legacy patient's case lands on the surviving patient
    let crown = find(&cases, "legacy_project_id", 301);
    assert_eq!(&crown["patient_id"], ada);
    assert_eq!(crown["title"], json!("Case #301"));

    let project = find(&target.rows("projects"), "legacy_project_id", 300).clone();
    assert_eq!(project["case_id"], json!(PROJECT_UUID));
    assert_eq!(project["status"], json!("active"));

    let file = &target.rows("case_files")[0];
    assert_eq!(file["case_id"], json!(PROJECT_UUID));
    assert_eq!(&file["uploaded_by"], doctor);
    assert_eq!(file["file_name"], json!("upper.stl"));
    assert_eq!(file["file_type"], json!("scan"));
}

#[tokio::test]
async fn test_every_written_uuid_is_valid() {
    let legacy = Arc::new(legacy_practice());
    let target = Arc::new(MemoryTargetStore::new());
    let status = Arc::new(RecordingStatusStore::new());

    migrate(legacy, target.clone(), status, config()).await.unwrap();

    let uuid_columns = [
        "id",
        "practice_id",
        "profile_id",
        "patient_id",
        "case_id",
        "doctor_id",
        "primary_doctor_id",
        "uploaded_by",
    ];
    for table in ["practices", "profiles", "practice_members", "patients", "cases", "projects", "case_files"] {
        for row in target.rows(table) {
            for column in uuid_columns {
                match row.get(column) {
                    None | Some(Value::Null) => {}
                    Some(value) => assert!(
                        value.as_str().and_then(parse_valid_uuid).is_some(),
                        "{table}.{column} = {value}"
                    ),
                }
            }
        }
    }
}

#[tokio::test]
async fn test_enum_columns_hold_defined_values() {
    let legacy = Arc::new(legacy_practice());
    let target = Arc::new(MemoryTargetStore::new());
    let status = Arc::new(RecordingStatusStore::new());

    migrate(legacy, target.clone(), status, config()).await.unwrap();

    let allowed: &[(&str, &str, &[&str])] = &[
        ("practices", "status", &["active", "inactive"]),
        ("profiles", "role", &["doctor", "technician", "staff", "admin"]),
        ("practice_members", "role", &["owner", "doctor", "staff"]),
        ("patients", "sex", &["male", "female", "other", "unknown"]),
        ("patients", "status", &["active", "archived"]),
        ("cases", "case_type", &["aligner", "retainer", "crown", "bridge", "implant", "denture", "other"]),
        ("cases", "status", &["draft", "submitted", "in_progress", "on_hold", "completed", "cancelled"]),
        ("projects", "status", &["pending", "active", "completed", "cancelled"]),
        ("case_files", "file_type", &["scan", "photo", "xray", "document", "other"]),
    ];
    for (table, column, values) in allowed {
        for row in target.rows(table) {
            let value = row[*column].as_str().unwrap();
            assert!(values.contains(&value), "{table}.{column} = {value}");
        }
    }
}

#[tokio::test]
async fn test_rerun_creates_no_duplicates() {
    let target = Arc::new(MemoryTargetStore::new());

    migrate(
        Arc::new(legacy_practice()),
        target.clone(),
        Arc::new(RecordingStatusStore::new()),
        config(),
    )
    .await
    .unwrap();
    let tables = ["practices", "profiles", "practice_members", "patients", "cases", "projects", "case_files"];
    let first: Vec<Vec<String>> = tables.iter().map(|t| ids(&target.rows(t))).collect();

    let summary = migrate(
        Arc::new(legacy_practice()),
        target.clone(),
        Arc::new(RecordingStatusStore::new()),
        config(),
    )
    .await
    .unwrap();
    let second: Vec<Vec<String>> = tables.iter().map(|t| ids(&target.rows(t))).collect();

    assert_eq!(first, second);
    assert_eq!(summary.report(EntityKind::Profile).unwrap().skipped, 1);
    assert_eq!(summary.data_quality.get(EntityKind::Profile).substituted_ids, 0);
}

#[tokio::test]
async fn test_duplicate_email_in_target_is_skipped() {
    let legacy = Arc::new(MockLegacySource::new().with_rows(
        USERS_SQL,
        vec![
            json!({"id": 1, "email": "taken@example.com", "last_name": "One"}),
            json!({"id": 2, "email": "new.two@example.com", "last_name": "Two"}),
            json!({"id": 3, "email": "new.three@example.com", "last_name": "Three"}),
        ],
    ));
    let target = Arc::new(MemoryTargetStore::new());
    target.seed(
        "profiles",
        "id",
        json!({"id": "3b241101-e2bb-4255-8caf-4136c566a962", "email": "Taken@Example.com", "legacy_user_id": null}),
    );
    let config = MigrationConfig {
        phases: PhaseSwitches {
            practices: false,
            practice_members: false,
            patients: false,
            cases: false,
            case_files: false,
            embeddings: false,
            ..PhaseSwitches::default()
        },
        ..config()
    };

    let summary = migrate(legacy, target.clone(), Arc::new(RecordingStatusStore::new()), config)
        .await
        .unwrap();

    let report = summary.report(EntityKind::Profile).unwrap();
    assert_eq!(report.load.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(target.count("profiles"), 3);
    assert_eq!(summary.entities.len(), 1);
}

#[tokio::test]
async fn test_nullify_policy_keeps_optional_references_null() {
    let legacy = Arc::new(MockLegacySource::new().with_rows(
        USERS_SQL,
        vec![json!({"id": 1, "email": "a@example.com", "last_name": "A", "office_id": 404})],
    ));
    let only_profiles = PhaseSwitches {
        practices: false,
        practice_members: false,
        patients: false,
        cases: false,
        case_files: false,
        embeddings: false,
        ..PhaseSwitches::default()
    };

    let rejecting = Arc::new(MemoryTargetStore::new());
    migrate(
        legacy.clone(),
        rejecting.clone(),
        Arc::new(RecordingStatusStore::new()),
        MigrationConfig {
            phases: only_profiles.clone(),
            ..config()
        },
    )
    .await
    .unwrap();
    assert_eq!(rejecting.count("profiles"), 0);

    let legacy = Arc::new(MockLegacySource::new().with_rows(
        USERS_SQL,
        vec![json!({"id": 1, "email": "a@example.com", "last_name": "A", "office_id": 404})],
    ));
    let nullifying = Arc::new(MemoryTargetStore::new());
    let summary = migrate(
        legacy,
        nullifying.clone(),
        Arc::new(RecordingStatusStore::new()),
        MigrationConfig {
            phases: only_profiles,
            missing_reference: MissingReferencePolicy::Nullify,
            ..config()
        },
    )
    .await
    .unwrap();

    let rows = nullifying.rows("profiles");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["practice_id"], Value::Null);
    assert_eq!(
        summary.data_quality.get(EntityKind::Profile).nullified_references,
        1
    );
}

#[tokio::test]
async fn test_cases_only_mapping_writes_no_projects() {
    let target = Arc::new(MemoryTargetStore::new());

    let summary = migrate(
        Arc::new(legacy_practice()),
        target.clone(),
        Arc::new(RecordingStatusStore::new()),
        MigrationConfig {
            project_mapping: ProjectMapping::CasesOnly,
            ..config()
        },
    )
    .await
    .unwrap();

    assert_eq!(target.count("cases"), 2);
    assert_eq!(target.count("projects"), 0);
    assert!(summary.report(EntityKind::Project).is_none());
}

#[tokio::test]
async fn test_embeddings_are_generated_for_migrated_cases() {
    let target = Arc::new(MemoryTargetStore::new());
    let provider = Arc::new(MockEmbeddingProvider::new(4));

    let summary = Migrator::new(
        Arc::new(legacy_practice()),
        target.clone(),
        Arc::new(RecordingStatusStore::new()),
        config(),
    )
    .with_embeddings(EmbeddingGenerator::new(provider.clone(), 10, Duration::ZERO))
    .run()
    .await
    .unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(target.count("case_embeddings"), 2);
    let embedding = target
        .rows("case_embeddings")
        .into_iter()
        .find(|row| row["case_id"] == json!(PROJECT_UUID))
        .unwrap();
    assert_eq!(embedding["model"], json!("mock-embedding"));
    assert_eq!(embedding["embedding"].as_array().unwrap().len(), 4);
    assert_eq!(
        summary.report(EntityKind::CaseEmbedding).unwrap().load.succeeded,
        2
    );
}

#[tokio::test]
async fn test_legacy_failure_fails_the_run_and_closes_the_connection() {
    let legacy = Arc::new(legacy_practice().failing_on(USERS_SQL));
    let target = Arc::new(MemoryTargetStore::new());
    let status = Arc::new(RecordingStatusStore::new());

    let result = migrate(legacy.clone(), target.clone(), status.clone(), config()).await;

    assert!(matches!(result, Err(MigrationError::LegacySource(_))));
    assert!(legacy.is_closed());
    // phases before the failure stay written
    assert_eq!(target.count("practices"), 2);

    let finished = status.finished.lock().unwrap().clone();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].state, RunState::Failed);
    assert!(finished[0].details["error"].as_str().unwrap().contains("closed"));
}

#[tokio::test]
async fn test_user_with_existing_email_keeps_their_patients_and_cases() {
    const SEEDED: &str = "3b241101-e2bb-4255-8caf-4136c566a962";
    let legacy = Arc::new(
        patients_practice(
            vec![json!({"id": 200, "first_name": "Ada", "last_name": "Lovelace",
                        "birthdate": "1985-12-10", "office_id": 1, "doctor_id": 10})],
            vec![json!({"id": 300, "patient_id": 200, "doctor_id": 10, "office_id": 1,
                        "project_type": 1, "status": 2})],
        )
        .with_rows(
            USERS_SQL,
            vec![json!({"id": 10, "email": "Doc@X.example", "last_name": "Smith", "user_type": 1})],
        ),
    );
    let target = Arc::new(MemoryTargetStore::new());
    target.seed(
        "profiles",
        "id",
        json!({"id": SEEDED, "email": "doc@x.example", "legacy_user_id": null}),
    );

    let summary = migrate(legacy, target.clone(), Arc::new(RecordingStatusStore::new()), config())
        .await
        .unwrap();

    let profiles = summary.report(EntityKind::Profile).unwrap();
    assert_eq!(profiles.skip_reasons.get("duplicate_email"), Some(&1));
    assert_eq!(target.count("profiles"), 1);

    let patient = find(&target.rows("patients"), "legacy_patient_id", 200).clone();
    assert_eq!(patient["primary_doctor_id"], json!(SEEDED));
    let case = find(&target.rows("cases"), "legacy_project_id", 300).clone();
    assert_eq!(case["doctor_id"], json!(SEEDED));
    assert_eq!(case["patient_id"], patient["id"]);
    assert_eq!(summary.report(EntityKind::Case).unwrap().rejected, 0);
}

#[tokio::test]
async fn test_duplicate_of_a_rejected_patient_is_migrated_instead() {
    // 200 points at an unknown office and never reaches the target
    let legacy = Arc::new(patients_practice(
        vec![ada(200, 77), ada(201, 1)],
        vec![project(300, 201)],
    ));
    let target = Arc::new(MemoryTargetStore::new());

    let summary = migrate(legacy, target.clone(), Arc::new(RecordingStatusStore::new()), config())
        .await
        .unwrap();

    let patients = target.rows("patients");
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0]["legacy_patient_id"], json!(201));

    let report = summary.report(EntityKind::Patient).unwrap();
    assert_eq!(report.rejected, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.skip_reasons.get("duplicate_patient"), None);
    assert_eq!(report.load.succeeded, 1);

    assert_eq!(target.count("cases"), 1);
    assert_no_dangling_patients(&target);
}

#[tokio::test]
async fn test_duplicate_of_a_failed_batch_is_migrated_instead() {
    let legacy = Arc::new(patients_practice(
        vec![ada(200, 1), ada(201, 1)],
        vec![project(300, 200), project(301, 201)],
    ));
    let target = Arc::new(MemoryTargetStore::new());
    target.inject(InjectedFailure {
        table: "patients".to_string(),
        call: 0,
        times: 1,
        retryable: false,
    });

    let summary = migrate(legacy, target.clone(), Arc::new(RecordingStatusStore::new()), config())
        .await
        .unwrap();

    let patients = target.rows("patients");
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0]["legacy_patient_id"], json!(201));

    let report = summary.report(EntityKind::Patient).unwrap();
    assert_eq!(report.load.failed, 1);
    assert_eq!(report.load.succeeded, 1);
    assert_eq!(report.skipped, 0);

    let cases = target.rows("cases");
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0]["legacy_project_id"], json!(301));
    assert_eq!(cases[0]["patient_id"], patients[0]["id"]);
    assert_eq!(summary.report(EntityKind::Case).unwrap().rejected, 1);
    assert_no_dangling_patients(&target);
}

#[tokio::test]
async fn test_failed_patients_leave_their_cases_and_files_rejected() {
    let legacy = Arc::new(
        patients_practice(
            vec![
                ada(200, 1),
                json!({"id": 201, "first_name": "Alan", "last_name": "Turing",
                       "birthdate": "1982-06-23", "office_id": 1}),
                ada(202, 1),
            ],
            vec![project(300, 200), project(301, 202)],
        )
        .with_rows(
            PROJECT_FILES_SQL,
            vec![json!({"id": 400, "project_id": 300, "file_url": "https://cdn.example.com/300/a.stl"})],
        ),
    );
    let target = Arc::new(MemoryTargetStore::new());
    target.inject(InjectedFailure {
        table: "patients".to_string(),
        call: 0,
        times: 100,
        retryable: false,
    });

    let summary = migrate(legacy, target.clone(), Arc::new(RecordingStatusStore::new()), config())
        .await
        .unwrap();

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(target.count("patients"), 0);
    let patients = summary.report(EntityKind::Patient).unwrap();
    assert_eq!(patients.load.failed, 3);
    assert_eq!(patients.skipped, 0);

    assert_eq!(target.count("cases"), 0);
    assert_eq!(summary.report(EntityKind::Case).unwrap().rejected, 2);
    assert_eq!(summary.data_quality.get(EntityKind::Case).rejected_references, 2);

    assert_eq!(target.count("case_files"), 0);
    assert_eq!(summary.report(EntityKind::CaseFile).unwrap().rejected, 1);
    assert_eq!(target.count("projects"), 0);
}

#[tokio::test]
async fn test_disabled_cases_switch_skips_projects_too() {
    let target = Arc::new(MemoryTargetStore::new());

    let summary = migrate(
        Arc::new(legacy_practice()),
        target.clone(),
        Arc::new(RecordingStatusStore::new()),
        MigrationConfig {
            phases: PhaseSwitches {
                cases: false,
                ..PhaseSwitches::default()
            },
            ..config()
        },
    )
    .await
    .unwrap();

    assert!(summary.report(EntityKind::Case).is_none());
    assert!(summary.report(EntityKind::Project).is_none());
    assert_eq!(target.count("cases"), 0);
    assert_eq!(target.count("projects"), 0);
    assert_eq!(target.count("patients"), 2);
    // files still run and find no case to attach to
    assert_eq!(summary.report(EntityKind::CaseFile).unwrap().rejected, 2);
}
