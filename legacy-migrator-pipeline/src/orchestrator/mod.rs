//! Orchestrator module for the legacy migration.
//!
//! Runs the phases in dependency order (practices, profiles, practice members,
//! patients, cases and projects, case files, embeddings). Every phase extracts
//! its legacy table, rebuilds the identifier maps it needs from the target,
//! transforms, validates references and loads. Phases run one after another
//! with one batch in flight at a time.
mod config;

pub use config::{MigrationConfig, PhaseSwitches, DEFAULT_STATUS_ID};

use chrono::{DateTime, Utc};
use legacy_migrator_repository::{LegacySource, StatusStore, TargetStore};
use legacy_migrator_shared::{
    Case, DataQualityReport, EntityKind, EntityReport, IdMap, LegacyPatient, LegacyUser,
    LoadReport, ProjectMapping, RunState, RunSummary, TargetRow,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::embeddings::EmbeddingGenerator;
use crate::errors::{MigrationError, TransformError};
use crate::extract::Extractor;
use crate::loader::BatchLoader;
use crate::progress::ProgressReporter;
use crate::reconcile::{load_email_index, load_id_map, load_patient_keys};
use crate::transform::{
    project_for_case, transform_case, transform_case_file, transform_member, transform_patient,
    transform_practice, transform_profile, validate_references, CaseFileMaps, CaseMaps,
    MemberMaps, PatientResolver, ProfileMaps, SkipReason, TransformOutcome, Transformed,
    Validated,
};

/// State carried from one phase to the next.
#[derive(Default)]
struct RunProgress {
    reports: Vec<EntityReport>,
    quality: DataQualityReport,
    /// Legacy users skipped for a taken email, mapped to the profile holding it.
    profile_aliases: Vec<(i64, Uuid)>,
    /// Legacy patients skipped as duplicates, mapped to the patient they duplicate.
    patient_aliases: Vec<(i64, Uuid)>,
    /// Cases written in this run, the input of the embedding phase.
    loaded_cases: Vec<Case>,
}

/// Runs a full migration from the legacy source into the target store.
pub struct Migrator {
    legacy: Arc<dyn LegacySource>,
    target: Arc<dyn TargetStore>,
    loader: BatchLoader,
    reporter: ProgressReporter,
    embeddings: Option<EmbeddingGenerator>,
    config: MigrationConfig,
}

impl Migrator {
    /// Creates a new `Migrator`.
    ///
    /// # Arguments
    ///
    /// * `legacy` - Read access to the legacy database; closed when the run ends.
    /// * `target` - Select and upsert access to the target store.
    /// * `status` - Where the run record and status row are written.
    /// * `config` - Batching, policies and phase switches.
    pub fn new(
        legacy: Arc<dyn LegacySource>,
        target: Arc<dyn TargetStore>,
        status: Arc<dyn StatusStore>,
        config: MigrationConfig,
    ) -> Self {
        Self {
            loader: BatchLoader::new(target.clone(), config.loader.clone()),
            reporter: ProgressReporter::new(status, config.status_id.clone()),
            legacy,
            target,
            embeddings: None,
            config,
        }
    }

    /// Enables the embedding phase.
    pub fn with_embeddings(mut self, generator: EmbeddingGenerator) -> Self {
        self.embeddings = Some(generator);
        self
    }

    /// Runs every enabled phase and returns the run summary.
    ///
    /// The legacy connection is closed whether the run succeeds or not. A fatal
    /// error marks the run failed before it is returned; batch failures and
    /// skipped records are not fatal and show up in the summary instead.
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<RunSummary, MigrationError> {
        self.reporter.start().await?;
        let run_id = self.reporter.run_id().await;
        let started_at = self.reporter.started_at().await.unwrap_or_else(Utc::now);

        let outcome = self.run_phases(started_at).await;
        self.legacy.close().await;

        match outcome {
            Ok(progress) => {
                let summary = RunSummary {
                    run_id,
                    state: RunState::Completed,
                    started_at,
                    finished_at: Utc::now(),
                    entities: progress.reports,
                    data_quality: progress.quality,
                };
                log_summary(&summary);

                let details = match serde_json::to_value(&summary) {
                    Ok(details) => details,
                    Err(e) => {
                        warn!(run_id = %run_id, error = %e, "Could not serialize run summary");
                        serde_json::Value::Null
                    }
                };
                self.reporter.complete(details).await?;
                Ok(summary)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Migration failed");
                let details = serde_json::json!({ "error": e.to_string() });
                if let Err(transition) = self.reporter.fail(details).await {
                    warn!(run_id = %run_id, error = %transition, "Could not mark run failed");
                }
                Err(e)
            }
        }
    }

    async fn run_phases(&self, now: DateTime<Utc>) -> Result<RunProgress, MigrationError> {
        let extractor = Extractor::new(self.legacy.as_ref());
        let phases = &self.config.phases;
        let mut progress = RunProgress::default();

        if phases.is_enabled(EntityKind::Practice) {
            self.migrate_practices(&extractor, &mut progress, now).await?;
        }
        if phases.is_enabled(EntityKind::Profile) {
            self.migrate_profiles(&extractor, &mut progress, now).await?;
        }
        if phases.is_enabled(EntityKind::PracticeMember) {
            self.migrate_members(&extractor, &mut progress, now).await?;
        }
        if phases.is_enabled(EntityKind::Patient) {
            self.migrate_patients(&extractor, &mut progress, now).await?;
        }
        if phases.is_enabled(EntityKind::Case) {
            self.migrate_cases(&extractor, &mut progress, now).await?;
        }
        if phases.is_enabled(EntityKind::CaseFile) {
            self.migrate_case_files(&extractor, &mut progress, now).await?;
        }
        if phases.is_enabled(EntityKind::CaseEmbedding) {
            self.migrate_embeddings(&mut progress).await;
        }

        Ok(progress)
    }

    #[instrument(skip_all)]
    async fn migrate_practices(
        &self,
        extractor: &Extractor<'_>,
        progress: &mut RunProgress,
        now: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let extracted = extractor.offices().await?;
        let practices = load_id_map(self.target.as_ref(), EntityKind::Practice).await?;

        let mut report = entity_report(EntityKind::Practice, extracted.total(), &extracted.malformed);
        let quality = progress.quality.entry(EntityKind::Practice);
        let outcomes: Vec<_> = extracted
            .rows
            .iter()
            .map(|office| transform_practice(office, &practices, quality, now))
            .collect();
        let records = collect_ready(&mut report, outcomes);

        self.load_records(records, &mut report, &mut progress.quality).await;
        progress.reports.push(report);
        Ok(())
    }

    /// Users whose email already has a profile are aliased to that profile,
    /// but only once it is known to be in the target. When the holder was
    /// produced in this run and its batch failed or was rejected, its claim on
    /// the email is dropped and the waiting users are transformed again.
    #[instrument(skip_all)]
    async fn migrate_profiles(
        &self,
        extractor: &Extractor<'_>,
        progress: &mut RunProgress,
        now: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let extracted = extractor.users().await?;
        let store = self.target.as_ref();
        let profiles = load_id_map(store, EntityKind::Profile).await?;
        let practices = load_id_map(store, EntityKind::Practice).await?;
        let mut emails = load_email_index(store).await?;
        let maps = ProfileMaps {
            profiles: &profiles,
            practices: &practices,
        };

        let mut persisted: HashSet<Uuid> = profiles
            .iter()
            .map(|(_, id)| id)
            .chain(emails.profile_ids())
            .collect();

        let mut report = entity_report(EntityKind::Profile, extracted.total(), &extracted.malformed);
        let mut pending: Vec<&LegacyUser> = extracted.rows.iter().collect();
        loop {
            let mut outcomes = Vec::with_capacity(pending.len());
            let mut waiting: Vec<(&LegacyUser, Uuid)> = Vec::new();
            let quality = progress.quality.entry(EntityKind::Profile);
            for user in pending {
                match transform_profile(user, &maps, &mut emails, quality, now) {
                    TransformOutcome::Skipped(SkipReason::DuplicateEmail { existing }) => {
                        waiting.push((user, existing))
                    }
                    outcome => outcomes.push(outcome),
                }
            }
            let records = collect_ready(&mut report, outcomes);

            let (validated, load) = self
                .load_records(records, &mut report, &mut progress.quality)
                .await;
            persisted.extend(self.loader.loaded_rows(&validated, &load).iter().map(|p| p.id));

            let (aliased, orphaned): (Vec<_>, Vec<_>) = waiting
                .into_iter()
                .partition(|(_, existing)| persisted.contains(existing));
            for (user, existing) in aliased {
                report.record_skip(SkipReason::DuplicateEmail { existing }.as_str());
                progress.profile_aliases.push((user.id, existing));
            }
            if orphaned.is_empty() {
                break;
            }

            info!(
                users = orphaned.len(),
                "Email holders were not written, retrying the users behind them"
            );
            emails.retain(|id| persisted.contains(id));
            pending = orphaned.into_iter().map(|(user, _)| user).collect();
        }

        progress.reports.push(report);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn migrate_members(
        &self,
        extractor: &Extractor<'_>,
        progress: &mut RunProgress,
        now: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let extracted = extractor.members().await?;
        let store = self.target.as_ref();
        let members = load_id_map(store, EntityKind::PracticeMember).await?;
        let practices = load_id_map(store, EntityKind::Practice).await?;
        let profiles = self.profile_map(progress).await?;
        let maps = MemberMaps {
            members: &members,
            practices: &practices,
            profiles: &profiles,
        };

        let mut report =
            entity_report(EntityKind::PracticeMember, extracted.total(), &extracted.malformed);
        let quality = progress.quality.entry(EntityKind::PracticeMember);
        let outcomes: Vec<_> = extracted
            .rows
            .iter()
            .map(|member| transform_member(member, &maps, quality, now))
            .collect();
        let records = collect_ready(&mut report, outcomes);

        self.load_records(records, &mut report, &mut progress.quality).await;
        progress.reports.push(report);
        Ok(())
    }

    /// Duplicates are aliased to the patient they match only once that patient
    /// is known to be in the target. Claims held by rows that failed to load
    /// are released and the duplicates behind them transformed again.
    #[instrument(skip_all)]
    async fn migrate_patients(
        &self,
        extractor: &Extractor<'_>,
        progress: &mut RunProgress,
        now: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let extracted = extractor.patients().await?;
        let store = self.target.as_ref();
        let patients = load_id_map(store, EntityKind::Patient).await?;
        let practices = load_id_map(store, EntityKind::Practice).await?;
        let profiles = self.profile_map(progress).await?;
        let keys = load_patient_keys(store).await?;
        let mut resolver = PatientResolver::new(&patients, &practices, &profiles, keys);
        let mut persisted = resolver.known_ids();

        let mut report = entity_report(EntityKind::Patient, extracted.total(), &extracted.malformed);
        let mut pending: Vec<&LegacyPatient> = extracted.rows.iter().collect();
        loop {
            let mut outcomes = Vec::with_capacity(pending.len());
            let mut waiting: Vec<(&LegacyPatient, Uuid)> = Vec::new();
            let quality = progress.quality.entry(EntityKind::Patient);
            for patient in pending {
                match transform_patient(patient, &mut resolver, quality, now) {
                    TransformOutcome::Skipped(SkipReason::DuplicatePatient { existing }) => {
                        waiting.push((patient, existing))
                    }
                    outcome => outcomes.push(outcome),
                }
            }
            let records = collect_ready(&mut report, outcomes);

            let (validated, load) = self
                .load_records(records, &mut report, &mut progress.quality)
                .await;
            persisted.extend(self.loader.loaded_rows(&validated, &load).iter().map(|p| p.id));

            let (aliased, orphaned): (Vec<_>, Vec<_>) = waiting
                .into_iter()
                .partition(|(_, existing)| persisted.contains(existing));
            for (patient, existing) in aliased {
                report.record_skip(SkipReason::DuplicatePatient { existing }.as_str());
                progress.patient_aliases.push((patient.id, existing));
            }
            if orphaned.is_empty() {
                break;
            }

            info!(
                patients = orphaned.len(),
                "Matched patients were not written, retrying the duplicates behind them"
            );
            resolver.release_claims(|id| persisted.contains(id));
            pending = orphaned.into_iter().map(|(patient, _)| patient).collect();
        }

        progress.reports.push(report);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn migrate_cases(
        &self,
        extractor: &Extractor<'_>,
        progress: &mut RunProgress,
        now: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let extracted = extractor.projects().await?;
        let store = self.target.as_ref();
        let cases = load_id_map(store, EntityKind::Case).await?;
        let mut patients = load_id_map(store, EntityKind::Patient).await?;
        patients.extend(progress.patient_aliases.iter().copied());
        let practices = load_id_map(store, EntityKind::Practice).await?;
        let profiles = self.profile_map(progress).await?;
        let maps = CaseMaps {
            cases: &cases,
            patients: &patients,
            practices: &practices,
            profiles: &profiles,
        };

        let mut report = entity_report(EntityKind::Case, extracted.total(), &extracted.malformed);
        let quality = progress.quality.entry(EntityKind::Case);
        let outcomes: Vec<_> = extracted
            .rows
            .iter()
            .map(|project| transform_case(project, &maps, quality, now))
            .collect();
        let records = collect_ready(&mut report, outcomes);

        let (validated, load) = self
            .load_records(records, &mut report, &mut progress.quality)
            .await;
        let loaded: Vec<Case> = self
            .loader
            .loaded_rows(&validated, &load)
            .into_iter()
            .cloned()
            .collect();
        progress.reports.push(report);

        if self.config.project_mapping == ProjectMapping::Split {
            let projects = load_id_map(store, EntityKind::Project).await?;
            let mut report = EntityReport::new(EntityKind::Project);
            report.extracted = loaded.len() as u64;
            let records: Vec<_> = loaded
                .iter()
                .map(|case| {
                    Transformed::resolved(project_for_case(case, projects.get(case.legacy_project_id)))
                })
                .collect();

            self.load_records(records, &mut report, &mut progress.quality).await;
            progress.reports.push(report);
        }

        progress.loaded_cases = loaded;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn migrate_case_files(
        &self,
        extractor: &Extractor<'_>,
        progress: &mut RunProgress,
        now: DateTime<Utc>,
    ) -> Result<(), MigrationError> {
        let extracted = extractor.project_files().await?;
        let store = self.target.as_ref();
        let files = load_id_map(store, EntityKind::CaseFile).await?;
        let cases = load_id_map(store, EntityKind::Case).await?;
        let profiles = self.profile_map(progress).await?;
        let maps = CaseFileMaps {
            files: &files,
            cases: &cases,
            profiles: &profiles,
        };

        let mut report = entity_report(EntityKind::CaseFile, extracted.total(), &extracted.malformed);
        let quality = progress.quality.entry(EntityKind::CaseFile);
        let outcomes: Vec<_> = extracted
            .rows
            .iter()
            .map(|file| transform_case_file(file, &maps, quality, now))
            .collect();
        let records = collect_ready(&mut report, outcomes);

        self.load_records(records, &mut report, &mut progress.quality).await;
        progress.reports.push(report);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn migrate_embeddings(&self, progress: &mut RunProgress) {
        let Some(generator) = &self.embeddings else {
            info!("Embedding generation not configured, skipping");
            return;
        };
        if progress.loaded_cases.is_empty() {
            info!("No cases migrated in this run, nothing to embed");
            return;
        }

        let cases: Vec<&Case> = progress.loaded_cases.iter().collect();
        let generated = generator.generate(&cases).await;

        let mut report = EntityReport::new(EntityKind::CaseEmbedding);
        report.extracted = cases.len() as u64;
        for _ in &generated.failed {
            report.record_skip("embedding_failed");
        }
        let records: Vec<_> = generated
            .embeddings
            .into_iter()
            .map(Transformed::resolved)
            .collect();

        self.load_records(records, &mut report, &mut progress.quality).await;
        progress.reports.push(report);
    }

    /// Profiles in the target plus the users aliased to them in this run.
    async fn profile_map(&self, progress: &RunProgress) -> Result<IdMap, MigrationError> {
        let mut profiles = load_id_map(self.target.as_ref(), EntityKind::Profile).await?;
        profiles.extend(progress.profile_aliases.iter().copied());
        Ok(profiles)
    }

    /// Validates references, then loads what passes.
    ///
    /// Counts accumulate on `report`, so a phase may call this more than once.
    /// Returns the validated rows with the load report of this call alone.
    async fn load_records<T: TargetRow>(
        &self,
        records: Vec<Transformed<T>>,
        report: &mut EntityReport,
        quality: &mut DataQualityReport,
    ) -> (Validated<T>, LoadReport) {
        let validated = validate_references(
            records,
            self.config.missing_reference,
            quality.entry(T::KIND),
        );
        report.rejected += validated.rejected().len() as u64;

        self.reporter.begin_phase(T::KIND, validated.len() as u64).await;
        let load = self.loader.load(&validated, &self.reporter).await;
        report.load.merge(load.clone());
        self.reporter.record_counts(T::KIND, &report.load).await;

        (validated, load)
    }
}

fn entity_report(kind: EntityKind, extracted: u64, malformed: &[TransformError]) -> EntityReport {
    let mut report = EntityReport::new(kind);
    report.extracted = extracted;
    for _ in malformed {
        report.record_skip(SkipReason::MalformedRow.as_str());
    }
    report
}

/// Keeps ready records and counts the skipped ones.
fn collect_ready<T>(
    report: &mut EntityReport,
    outcomes: Vec<TransformOutcome<T>>,
) -> Vec<Transformed<T>> {
    let mut records = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            TransformOutcome::Ready(record) => records.push(record),
            TransformOutcome::Skipped(reason) => report.record_skip(reason.as_str()),
        }
    }
    records
}

fn log_summary(summary: &RunSummary) {
    for report in &summary.entities {
        info!(
            entity = %report.kind,
            extracted = report.extracted,
            skipped = report.skipped,
            rejected = report.rejected,
            loaded = report.load.succeeded,
            failed = report.load.failed,
            "Entity summary"
        );
    }

    for (kind, quality) in &summary.data_quality.entities {
        if !quality.is_clean() {
            warn!(
                entity = %kind,
                substituted_ids = quality.substituted_ids,
                defaulted_fields = quality.defaulted_fields,
                unmapped_codes = quality.unmapped_codes,
                rejected_references = quality.rejected_references,
                nullified_references = quality.nullified_references,
                "Data quality"
            );
        }
    }

    info!(
        run_id = %summary.run_id,
        written = summary.total_written(),
        failed = summary.total_failed(),
        elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
        "Migration completed"
    );
}
