//! Case processing pipeline.
//!
//! Runs extraction, consistency and qualification for one case and persists
//! the outcome through the repository traits.
//!
//! # Execution Flow
//! 1. Lock the case and mark it `PROCESSING`
//! 2. Resolve the referenced files; missing ones become an integrity warning
//! 3. Fan-out: extract every file concurrently (bounded)
//! 4. Fan-in: compare the extracted accounts
//! 5. Qualify the accident
//! 6. Persist everything in one write, unless the case was withdrawn or deleted

use adjudicator_core::{
    generate_card, AccidentCard, AdjudicationError, Case, CaseAnalysis, CaseId, CardConfig,
    CardSource, ConsistencyRequest, DecisionRequest, Differences, DoctorOpinion, ExtractedFile,
    ExtractionResponse, ExtractionSet, FailedExtraction, FailureKind, FileId, FileRecord, HumanReview,
    IntegrityError, PipelineStage, QualificationInput, QualificationResult, StageFailure,
    Subject, SubjectId,
};
use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedMutexGuard, Semaphore};

use crate::cache::ExtractionCache;
use crate::config::{PipelineSettings, RuntimeConfig};
use crate::consistency::ConsistencyChecker;
use crate::extractor::{DocumentExtractor, Upload};
use crate::oracle::{OracleClient, ResilientOracle};
use crate::qualifier::LegalQualifier;
use crate::store::{CaseRepository, FileRepository, StoreError, SubjectRepository};
use crate::RuntimeError;

/// How a processing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Qualification computed; the case waits for a reviewer.
    Completed,
    /// A stage failed on an unusable oracle answer, or no document could be
    /// analysed; the case stays `PROCESSING`.
    NeedsAttention,
    /// The oracle was unavailable; the case was closed as `FAILED`.
    Failed,
    /// The case was withdrawn or deleted mid-run; nothing was written.
    Discarded,
}

/// Result of [`CasePipeline::dispatch_processing`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOutcome {
    pub status: OutcomeStatus,
    /// The stored case after the run. `None` when discarded.
    pub case: Option<Case>,
    pub integrity_warnings: Vec<IntegrityError>,
}

/// Hands out one async mutex per case.
#[derive(Default)]
struct CaseLocks {
    locks: Mutex<HashMap<CaseId, Arc<tokio::sync::Mutex<()>>>>,
}

impl CaseLocks {
    async fn acquire(&self, id: CaseId) -> OwnedMutexGuard<()> {
        self.lock_for(id).lock_owned().await
    }

    /// Acquire within `timeout`, or `None` if another writer holds the case.
    async fn try_acquire(&self, id: CaseId, timeout: Duration) -> Option<OwnedMutexGuard<()>> {
        tokio::time::timeout(timeout, self.lock_for(id).lock_owned())
            .await
            .ok()
    }

    /// Entries nobody holds or waits on are dropped before handing one out.
    fn lock_for(&self, id: CaseId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.retain(|key, lock| *key == id || Arc::strong_count(lock) > 1);
        locks.entry(id).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }

    fn remove(&self, id: CaseId) {
        self.locks.lock().remove(&id);
    }
}

/// What a run decided to write.
struct RunResult {
    analysis: CaseAnalysis,
    failure: Option<StageFailure>,
    /// Reason for closing the case as failed.
    fatal: Option<String>,
}

pub struct CasePipeline {
    cases: Arc<dyn CaseRepository>,
    files: Arc<dyn FileRepository>,
    subjects: Arc<dyn SubjectRepository>,
    extractor: DocumentExtractor,
    checker: ConsistencyChecker,
    qualifier: LegalQualifier,
    locks: CaseLocks,
    settings: PipelineSettings,
    card: CardConfig,
}

impl CasePipeline {
    /// Build a pipeline over one store. Oracle calls go through retries and
    /// the circuit breaker configured in `config`.
    pub fn new<S>(oracle: Arc<dyn OracleClient>, store: Arc<S>, config: &RuntimeConfig) -> Self
    where
        S: CaseRepository + FileRepository + SubjectRepository + 'static,
    {
        let oracle: Arc<dyn OracleClient> = Arc::new(ResilientOracle::new(
            oracle,
            config.retry.clone(),
            config.circuit_breaker.clone(),
        ));
        let cache = ExtractionCache::new(config.cache.max_entries, config.cache.ttl);

        Self {
            cases: store.clone(),
            files: store.clone(),
            subjects: store.clone(),
            extractor: DocumentExtractor::new(oracle.clone(), store, cache),
            checker: ConsistencyChecker::new(oracle.clone()),
            qualifier: LegalQualifier::new(oracle, &config.qualification),
            locks: CaseLocks::default(),
            settings: config.pipeline.clone(),
            card: config.card.clone(),
        }
    }

    pub fn extractor(&self) -> &DocumentExtractor {
        &self.extractor
    }

    /// Store the uploads and open a pending case over them.
    pub async fn create_case(
        &self,
        subject_id: Option<SubjectId>,
        uploads: Vec<Upload>,
    ) -> Result<Case, RuntimeError> {
        if uploads.is_empty() {
            return Err(AdjudicationError::Validation("a case needs at least one file".to_string()).into());
        }
        self.ensure_subject(subject_id).await?;

        let mut file_ids = Vec::with_capacity(uploads.len());
        for upload in uploads {
            file_ids.push(self.extractor.upload(upload).await?.id);
        }
        self.create_case_for_files(subject_id, file_ids).await
    }

    /// Open a pending case over files that were stored earlier.
    ///
    /// File ids are not checked here; dangling ones are reported when the
    /// case is processed.
    pub async fn create_case_for_files(
        &self,
        subject_id: Option<SubjectId>,
        file_ids: Vec<FileId>,
    ) -> Result<Case, RuntimeError> {
        if file_ids.is_empty() {
            return Err(AdjudicationError::Validation("a case needs at least one file".to_string()).into());
        }
        self.ensure_subject(subject_id).await?;

        let case = Case::new(subject_id, file_ids, Utc::now());
        self.cases.insert_case(case.clone()).await?;
        tracing::info!(case_id = %case.id, files = case.file_ids.len(), "Case created");
        Ok(case)
    }

    async fn ensure_subject(&self, subject_id: Option<SubjectId>) -> Result<(), RuntimeError> {
        if let Some(id) = subject_id {
            if self.subjects.get_subject(id).await?.is_none() {
                return Err(StoreError::SubjectNotFound(id).into());
            }
        }
        Ok(())
    }

    /// Extract facts from new documents without opening a case.
    pub async fn extract_documents(&self, uploads: Vec<Upload>) -> Result<ExtractionResponse, RuntimeError> {
        let mut files = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let record = self
                .extractor
                .extract(upload.bytes, &upload.media_type, &upload.original_name)
                .await?;
            if let Some(extracted) = record.extracted {
                files.push(ExtractedFile {
                    file_id: record.id,
                    original_name: record.original_name,
                    facts: extracted.payload,
                });
            }
        }
        Ok(ExtractionResponse { files })
    }

    pub async fn get_case(&self, case_id: CaseId) -> Result<Case, RuntimeError> {
        self.cases
            .get_case(case_id)
            .await?
            .ok_or_else(|| StoreError::CaseNotFound(case_id).into())
    }

    /// Run the full pipeline for one case.
    #[tracing::instrument(skip_all, fields(case_id = %case_id))]
    pub async fn dispatch_processing(&self, case_id: CaseId) -> Result<ProcessingOutcome, RuntimeError> {
        let _guard = self.locks.acquire(case_id).await;

        let case = self.get_case(case_id).await?;
        if case.withdrawn {
            return Err(AdjudicationError::Withdrawn(case_id).into());
        }
        let case = match self.persist(case_id, |c| c.begin_processing(Utc::now())).await? {
            Some(case) => case,
            None => return Ok(Self::discarded()),
        };
        tracing::info!(files = case.file_ids.len(), "Processing dispatched");

        let (records, missing) = self.resolve_files(&case).await?;
        let mut integrity_warnings = Vec::new();
        if !missing.is_empty() {
            let warning = IntegrityError {
                case_id,
                missing: missing.clone(),
            };
            tracing::warn!(warning = %warning, "Case references missing files");
            integrity_warnings.push(warning);
        }

        let run = self.run_stages(&case, records, missing).await?;
        let status = match (&run.fatal, &run.failure) {
            (Some(_), _) => OutcomeStatus::Failed,
            (None, Some(_)) => OutcomeStatus::NeedsAttention,
            (None, None) => OutcomeStatus::Completed,
        };

        let stored = self
            .persist(case_id, move |c| {
                let now = Utc::now();
                c.record_analysis(run.analysis, now)?;
                if let Some(failure) = run.failure {
                    c.record_stage_failure(failure)?;
                }
                if let Some(reason) = run.fatal {
                    c.fail_automated(reason, now)?;
                }
                Ok(())
            })
            .await?;

        match stored {
            Some(case) => {
                tracing::info!(status = ?status, case_status = %case.status, "Processing finished");
                Ok(ProcessingOutcome {
                    status,
                    case: Some(case),
                    integrity_warnings,
                })
            }
            None => {
                tracing::info!("Case withdrawn or deleted during processing, results discarded");
                Ok(ProcessingOutcome {
                    integrity_warnings,
                    ..Self::discarded()
                })
            }
        }
    }

    async fn resolve_files(&self, case: &Case) -> Result<(Vec<FileRecord>, Vec<FileId>), RuntimeError> {
        let mut records = Vec::with_capacity(case.file_ids.len());
        let mut missing = Vec::new();
        for id in &case.file_ids {
            match self.files.get_file(id).await? {
                Some(record) => records.push(record),
                None => missing.push(id.clone()),
            }
        }
        Ok((records, missing))
    }

    async fn run_stages(
        &self,
        case: &Case,
        records: Vec<FileRecord>,
        missing: Vec<FileId>,
    ) -> Result<RunResult, RuntimeError> {
        let semaphore = Semaphore::new(self.settings.max_parallel_extractions.max(1));
        let semaphore = &semaphore;
        let results = join_all(records.into_iter().map(|record| async move {
            let _permit = semaphore.acquire().await;
            let file_id = record.id.clone();
            (file_id, self.extractor.extract_record(record).await)
        }))
        .await;

        let mut extraction = ExtractionSet {
            missing_file_ids: missing,
            ..Default::default()
        };
        let mut failure = None;
        let mut unavailable = None;

        for (file_id, result) in results {
            match result {
                Ok(file) => extraction.files.push(file),
                Err(RuntimeError::Adjudication(err)) => {
                    tracing::warn!(file_id = %file_id, error = %err, "Extraction failed");
                    extraction.failed.push(FailedExtraction {
                        file_id,
                        message: err.to_string(),
                    });
                    if matches!(err, AdjudicationError::Oracle { .. }) {
                        unavailable.get_or_insert_with(|| err.to_string());
                    }
                    failure = Some(stage_failure(PipelineStage::Extraction, &err));
                }
                Err(other) => return Err(other),
            }
        }

        if let Some(reason) = unavailable {
            return Ok(RunResult {
                analysis: CaseAnalysis {
                    extraction,
                    consistency: Differences::unchecked("ekstrakcja dokumentów nie została ukończona"),
                    qualification: None,
                },
                failure,
                fatal: Some(format!("Automatyczna analiza przerwana: {}", reason)),
            });
        }

        if extraction.files.is_empty() {
            tracing::warn!("No document could be extracted, qualification skipped");
            let failure = failure.unwrap_or_else(|| StageFailure {
                stage: PipelineStage::Extraction,
                kind: FailureKind::Validation,
                message: "Sprawa nie zawiera żadnego dostępnego dokumentu do analizy".to_string(),
                raw_response: None,
                occurred_at: Utc::now(),
            });
            return Ok(RunResult {
                analysis: CaseAnalysis {
                    extraction,
                    consistency: Differences::unchecked("brak dokumentów z wyodrębnionymi danymi"),
                    qualification: None,
                },
                failure: Some(failure),
                fatal: None,
            });
        }

        let consistency = self.checker.check(&extraction.files, None).await;

        let subject = match case.subject_id {
            Some(id) => self.subjects.get_subject(id).await?,
            None => None,
        };
        if subject.is_none() {
            tracing::warn!("Case has no subject, PKD codes unavailable");
        }
        let input = qualification_input(&extraction.files, subject.as_ref(), case.human_review.as_ref());

        let mut fatal = None;
        let qualification = match self.qualifier.qualify(&input).await {
            Ok(result) => Some(result),
            Err(err) => match err.failure_kind() {
                Some(_) => {
                    tracing::warn!(error = %err, "Qualification failed");
                    failure = Some(stage_failure(PipelineStage::Qualification, &err));
                    if matches!(err, AdjudicationError::Oracle { .. }) {
                        fatal = Some(format!("Automatyczna kwalifikacja przerwana: {}", err));
                    }
                    None
                }
                None => return Err(err.into()),
            },
        };

        Ok(RunResult {
            analysis: CaseAnalysis {
                extraction,
                consistency,
                qualification,
            },
            failure,
            fatal,
        })
    }

    /// Re-read the case, apply `mutate` and store it.
    ///
    /// Returns `None` without writing when the case was withdrawn or deleted.
    async fn persist<F>(&self, case_id: CaseId, mutate: F) -> Result<Option<Case>, RuntimeError>
    where
        F: FnOnce(&mut Case) -> Result<(), AdjudicationError>,
    {
        let mut case = match self.cases.get_case(case_id).await? {
            Some(case) if !case.withdrawn => case,
            _ => return Ok(None),
        };
        let revision = case.revision;
        mutate(&mut case)?;

        match self.cases.update_case(case, revision).await {
            Ok(stored) => Ok(Some(stored)),
            Err(StoreError::CaseNotFound(_)) => Ok(None),
            Err(StoreError::Conflict { found, .. }) => match self.cases.get_case(case_id).await? {
                Some(current) if !current.withdrawn => Err(AdjudicationError::ConcurrentModification {
                    case_id,
                    expected: revision,
                    found,
                }
                .into()),
                _ => Ok(None),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn discarded() -> ProcessingOutcome {
        ProcessingOutcome {
            status: OutcomeStatus::Discarded,
            case: None,
            integrity_warnings: Vec::new(),
        }
    }

    /// Apply a reviewer decision to the case at `expected_revision`.
    #[tracing::instrument(skip_all, fields(case_id = %case_id, decision = ?request.decision))]
    pub async fn decide(
        &self,
        case_id: CaseId,
        request: DecisionRequest,
        expected_revision: u64,
    ) -> Result<Case, RuntimeError> {
        request.validate()?;

        let _guard = self.lock_for_review(case_id, expected_revision).await?;
        let mut case = self.get_case(case_id).await?;
        if case.revision != expected_revision {
            return Err(AdjudicationError::ConcurrentModification {
                case_id,
                expected: expected_revision,
                found: case.revision,
            }
            .into());
        }

        case.apply_decision(request.decision, request.comment, Utc::now())?;
        let stored = self.cases.update_case(case, expected_revision).await?;
        tracing::info!(status = %stored.status, revision = stored.revision, "Decision recorded");
        Ok(stored)
    }

    /// Attach a medical opinion. The next processing run qualifies with it.
    pub async fn record_medical_opinion(
        &self,
        case_id: CaseId,
        opinion: DoctorOpinion,
    ) -> Result<Case, RuntimeError> {
        let current = self.get_case(case_id).await?;
        let _guard = self.lock_for_review(case_id, current.revision).await?;

        let mut case = self.get_case(case_id).await?;
        let revision = case.revision;
        case.record_medical_opinion(opinion, Utc::now())?;
        Ok(self.cases.update_case(case, revision).await?)
    }

    async fn lock_for_review(
        &self,
        case_id: CaseId,
        expected_revision: u64,
    ) -> Result<OwnedMutexGuard<()>, RuntimeError> {
        match self
            .locks
            .try_acquire(case_id, self.settings.decision_lock_timeout)
            .await
        {
            Some(guard) => Ok(guard),
            None => {
                let found = self.get_case(case_id).await?.revision;
                tracing::warn!(case_id = %case_id, "Case is being processed, review rejected");
                Err(AdjudicationError::ConcurrentModification {
                    case_id,
                    expected: expected_revision,
                    found,
                }
                .into())
            }
        }
    }

    /// Withdraw a case. A run in flight discards its results.
    pub async fn withdraw(&self, case_id: CaseId) -> Result<Case, RuntimeError> {
        const ATTEMPTS: usize = 3;

        let mut last_conflict = None;
        for _ in 0..ATTEMPTS {
            let mut case = self.get_case(case_id).await?;
            let revision = case.revision;
            case.withdraw(Utc::now())?;

            match self.cases.update_case(case, revision).await {
                Ok(stored) => {
                    tracing::info!(case_id = %case_id, "Case withdrawn");
                    return Ok(stored);
                }
                Err(e @ StoreError::Conflict { .. }) => last_conflict = Some(e),
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_conflict
            .map(RuntimeError::from)
            .unwrap_or_else(|| StoreError::CaseNotFound(case_id).into()))
    }

    /// Delete a case. A run in flight discards its results.
    pub async fn delete_case(&self, case_id: CaseId) -> Result<bool, RuntimeError> {
        let removed = self.cases.delete_case(case_id).await?;
        self.locks.remove(case_id);
        if removed {
            tracing::info!(case_id = %case_id, "Case deleted");
        }
        Ok(removed)
    }

    /// Qualify a standalone request.
    pub async fn qualify(&self, input: &QualificationInput) -> Result<QualificationResult, RuntimeError> {
        Ok(self.qualifier.qualify(input).await?)
    }

    /// Compare a case's documents, optionally against a separate statement.
    ///
    /// Does not modify the case.
    pub async fn check_consistency(&self, request: ConsistencyRequest) -> Result<Differences, RuntimeError> {
        let case = self.get_case(request.case_id).await?;
        let (records, missing) = self.resolve_files(&case).await?;
        if !missing.is_empty() {
            let warning = IntegrityError {
                case_id: case.id,
                missing,
            };
            tracing::warn!(warning = %warning, "Case references missing files");
        }

        let mut files = Vec::with_capacity(records.len());
        for record in records {
            let file_id = record.id.clone();
            match self.extractor.extract_record(record).await {
                Ok(file) => files.push(file),
                Err(e) => tracing::warn!(file_id = %file_id, error = %e, "File left out of comparison"),
            }
        }

        Ok(self.checker.check(&files, request.statement.as_deref()).await)
    }

    /// Accident card of a finalized, qualified case.
    pub async fn accident_card(&self, case_id: CaseId) -> Result<AccidentCard, RuntimeError> {
        let case = self.get_case(case_id).await?;

        let subject = match case.subject_id {
            Some(id) => self.subjects.get_subject(id).await?,
            None => None,
        };

        let mut addresses = HashMap::new();
        if let Some(subject) = &subject {
            let ids = [
                subject.residential_address,
                subject.correspondence_address,
                subject.business_address,
            ];
            for id in ids.into_iter().flatten() {
                if let Some(address) = self.subjects.get_address(id).await? {
                    addresses.insert(id, address);
                }
            }
        }

        let (files, _) = self.resolve_files(&case).await?;
        let source = CardSource {
            case,
            subject,
            addresses,
            files,
        };
        Ok(generate_card(&source, &self.card)?)
    }
}

fn stage_failure(stage: PipelineStage, err: &AdjudicationError) -> StageFailure {
    StageFailure {
        stage,
        kind: err.failure_kind().unwrap_or(FailureKind::Validation),
        message: err.to_string(),
        raw_response: err.raw_response().map(str::to_string),
        occurred_at: Utc::now(),
    }
}

/// Qualification request assembled from the extracted accounts.
fn qualification_input(
    files: &[ExtractedFile],
    subject: Option<&Subject>,
    review: Option<&HumanReview>,
) -> QualificationInput {
    let mut description: Vec<String> = Vec::new();
    let mut activities: Vec<String> = Vec::new();

    for file in files {
        let facts = &file.facts;
        if let Some(circumstances) = facts.circumstances.known() {
            push_unique(&mut description, circumstances.trim().to_string());
        }
        if let Some(causes) = facts.causes.known() {
            push_unique(&mut description, format!("Przyczyny: {}", causes.trim()));
        }
        if let Some(injury) = facts.injury_description.known() {
            push_unique(&mut description, format!("Uraz: {}", injury.trim()));
        }
        if let Some(activity) = facts.activities_at_time.known() {
            push_unique(&mut activities, activity.trim().to_string());
        }
    }

    QualificationInput {
        accident_description: description.join("\n"),
        activities_performed: activities.join("; "),
        pkd_codes: subject.map(|s| s.pkd_codes.clone()).unwrap_or_default(),
        doctor_opinion: review.and_then(|r| r.doctor_opinion.clone()),
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !value.is_empty() && !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjudicator_core::{AccidentFacts, Knowable, PkdCode};
    use proptest::prelude::*;

    fn file(circumstances: &str, activity: &str) -> ExtractedFile {
        ExtractedFile {
            file_id: FileId::from(circumstances),
            original_name: "a.pdf".to_string(),
            facts: AccidentFacts {
                circumstances: Knowable::Known(circumstances.to_string()),
                activities_at_time: Knowable::Known(activity.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_qualification_input_merges_accounts() {
        let files = [
            file("Upadek z drabiny", "Montaż oświetlenia"),
            file("Upadek z drabiny", "Montaż oświetlenia"),
            file("Drabina się przesunęła", "Montaż oświetlenia"),
        ];
        let subject = Subject {
            id: SubjectId::new(),
            name: None,
            surname: None,
            national_id: None,
            nip: None,
            regon: None,
            pkd_codes: vec![PkdCode::new("43.21.Z", "Wykonywanie instalacji elektrycznych")],
            residential_address: None,
            correspondence_address: None,
            business_address: None,
        };

        let input = qualification_input(&files, Some(&subject), None);
        assert_eq!(input.accident_description, "Upadek z drabiny\nDrabina się przesunęła");
        assert_eq!(input.activities_performed, "Montaż oświetlenia");
        assert_eq!(input.pkd_codes.len(), 1);
        assert!(input.doctor_opinion.is_none());
    }

    #[test]
    fn test_unknown_facts_leave_input_blank() {
        let files = [ExtractedFile {
            file_id: FileId::from("x"),
            original_name: "x.pdf".to_string(),
            facts: AccidentFacts::default(),
        }];
        let input = qualification_input(&files, None, None);
        assert!(input.accident_description.is_empty());
        assert!(input.pkd_codes.is_empty());
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_stage_failure_keeps_raw_response() {
        let err = AdjudicationError::parse(PipelineStage::Extraction, "no JSON", "Szanowni Państwo");
        let failure = stage_failure(PipelineStage::Extraction, &err);
        assert_eq!(failure.kind, adjudicator_core::FailureKind::Parse);
        assert_eq!(failure.raw_response.as_deref(), Some("Szanowni Państwo"));
    }

    proptest! {
        #[test]
        fn test_qualification_input_lines_are_unique(
            accounts in proptest::collection::vec(("[a-z ]{1,12}", "[a-z]{1,8}"), 1..6)
        ) {
            let files: Vec<ExtractedFile> = accounts
                .iter()
                .map(|(circumstances, activity)| file(circumstances, activity))
                .collect();
            let input = qualification_input(&files, None, None);

            let lines: Vec<&str> = input.accident_description.lines().collect();
            let mut deduplicated = lines.clone();
            deduplicated.sort_unstable();
            deduplicated.dedup();
            prop_assert_eq!(lines.len(), deduplicated.len());

            for (circumstances, _) in &accounts {
                let trimmed = circumstances.trim();
                if !trimmed.is_empty() {
                    prop_assert!(lines.contains(&trimmed));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_case_locks_time_out_while_held() {
        let locks = CaseLocks::default();
        let id = CaseId::new();

        let guard = locks.acquire(id).await;
        assert!(locks.try_acquire(id, Duration::from_millis(10)).await.is_none());
        drop(guard);
        assert!(locks.try_acquire(id, Duration::from_millis(10)).await.is_some());
    }

    #[tokio::test]
    async fn test_released_case_locks_are_pruned() {
        let locks = CaseLocks::default();
        let held = CaseId::new();
        let guard = locks.acquire(held).await;

        for _ in 0..10 {
            drop(locks.acquire(CaseId::new()).await);
        }
        assert_eq!(locks.len(), 2);

        let next = CaseId::new();
        let _next_guard = locks.acquire(next).await;
        assert_eq!(locks.len(), 2);
        assert!(locks.try_acquire(held, Duration::from_millis(10)).await.is_none());

        drop(guard);
        assert!(locks.try_acquire(held, Duration::from_millis(10)).await.is_some());
    }
}
