//! The case lifecycle.
//!
//! `PENDING -> PROCESSING -> {ACCEPTED | FAILED}`. A `NEED_MORE_INFO` review
//! keeps the case in `PROCESSING`. Terminal cases reject every further
//! transition. All transitions are pure; persisting them is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AdjudicationError;
use crate::types::{
    CaseId, CaseStatus, Decision, Differences, DoctorOpinion, ExtractionSet, FileId, FinalDecision,
    HumanReview, QualificationResult, ReviewNote, StageFailure, SubjectId, Verdict, Versioned,
};

/// One claim under adjudication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: CaseId,
    pub subject_id: Option<SubjectId>,
    pub status: CaseStatus,
    pub file_ids: Vec<FileId>,
    pub extraction_result: Option<Versioned<ExtractionSet>>,
    pub qualification: Option<Versioned<QualificationResult>>,
    pub consistency: Option<Versioned<Differences>>,
    pub human_review: Option<HumanReview>,
    pub final_decision: Option<FinalDecision>,
    #[serde(default)]
    pub stage_failure: Option<StageFailure>,
    #[serde(default)]
    pub withdrawn: bool,
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseAnalysis {
    pub extraction: ExtractionSet,
    pub consistency: Differences,
    pub qualification: Option<QualificationResult>,
}

impl Case {
    /// A new pending case. Duplicate file ids are dropped, order is kept.
    pub fn new(subject_id: Option<SubjectId>, file_ids: Vec<FileId>, now: DateTime<Utc>) -> Self {
        let mut unique: Vec<FileId> = Vec::with_capacity(file_ids.len());
        for id in file_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        Self {
            id: CaseId::new(),
            subject_id,
            status: CaseStatus::Pending,
            file_ids: unique,
            extraction_result: None,
            qualification: None,
            consistency: None,
            human_review: None,
            final_decision: None,
            stage_failure: None,
            withdrawn: false,
            revision: 0,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), AdjudicationError> {
        if self.withdrawn {
            return Err(AdjudicationError::Withdrawn(self.id));
        }
        if self.is_terminal() {
            return Err(AdjudicationError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }

    /// Mark processing as dispatched. Allowed again while still processing,
    /// so a case waiting for more information can be re-run.
    pub fn begin_processing(&mut self, now: DateTime<Utc>) -> Result<(), AdjudicationError> {
        self.ensure_open("dispatch")?;
        self.status = CaseStatus::Processing;
        self.updated_at = now;
        Ok(())
    }

    /// Store the outputs of a pipeline run.
    ///
    /// A missing qualification clears any earlier one: only the latest run is
    /// authoritative.
    pub fn record_analysis(&mut self, analysis: CaseAnalysis, now: DateTime<Utc>) -> Result<(), AdjudicationError> {
        self.ensure_open("record analysis for")?;
        if self.status != CaseStatus::Processing {
            return Err(AdjudicationError::InvalidTransition {
                from: self.status,
                action: "record analysis for",
            });
        }

        self.extraction_result = Some(Versioned::current(analysis.extraction));
        self.consistency = Some(Versioned::current(analysis.consistency));
        self.qualification = analysis.qualification.map(Versioned::current);
        if self.qualification.is_some() {
            self.stage_failure = None;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn record_stage_failure(&mut self, failure: StageFailure) -> Result<(), AdjudicationError> {
        self.ensure_open("record a failure for")?;
        self.updated_at = failure.occurred_at;
        self.stage_failure = Some(failure);
        Ok(())
    }

    /// Apply a reviewer decision.
    ///
    /// `ACCEPTED` and `FAILED` need a processing case with a computed
    /// qualification. `NEED_MORE_INFO` needs a comment and only records it.
    pub fn apply_decision(
        &mut self,
        decision: Decision,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AdjudicationError> {
        self.ensure_open("decide")?;
        if self.status != CaseStatus::Processing {
            return Err(AdjudicationError::InvalidTransition {
                from: self.status,
                action: "decide",
            });
        }

        match decision.verdict() {
            Some(verdict) => {
                if self.qualification.is_none() {
                    return Err(AdjudicationError::Validation(
                        "qualification must be computed before a final decision".to_string(),
                    ));
                }
                self.close(verdict, comment, false, now);
            }
            None => {
                let comment = comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| {
                        AdjudicationError::Validation(
                            "NEED_MORE_INFO requires a comment".to_string(),
                        )
                    })?;
                self.human_review
                    .get_or_insert_with(HumanReview::default)
                    .notes
                    .push(ReviewNote {
                        comment,
                        recorded_at: now,
                    });
                self.updated_at = now;
            }
        }
        Ok(())
    }

    /// Close the case as failed because the pipeline could not complete.
    pub fn fail_automated(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<(), AdjudicationError> {
        self.ensure_open("fail")?;
        self.close(Verdict::Failed, Some(reason.into()), true, now);
        Ok(())
    }

    /// Withdraw the case. In-flight runs discard their results.
    pub fn withdraw(&mut self, now: DateTime<Utc>) -> Result<(), AdjudicationError> {
        self.ensure_open("withdraw")?;
        self.withdrawn = true;
        self.updated_at = now;
        Ok(())
    }

    /// Attach the medical examiner's opinion used by later qualification runs.
    pub fn record_medical_opinion(&mut self, opinion: DoctorOpinion, now: DateTime<Utc>) -> Result<(), AdjudicationError> {
        self.ensure_open("record a medical opinion for")?;
        self.human_review
            .get_or_insert_with(HumanReview::default)
            .doctor_opinion = Some(opinion);
        self.updated_at = now;
        Ok(())
    }

    fn close(&mut self, verdict: Verdict, comment: Option<String>, automated: bool, now: DateTime<Utc>) {
        self.status = verdict.status();
        self.final_decision = Some(FinalDecision {
            decision: verdict,
            comment,
            decided_at: now,
            automated,
        });
        self.resolved_at = Some(now);
        self.updated_at = now;
    }

    /// Check the lifecycle invariants. Returns the violated ones.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let terminal = self.is_terminal();

        if self.final_decision.is_some() != terminal {
            violations.push(format!(
                "finalDecision presence does not match status {}",
                self.status
            ));
        }
        if self.resolved_at.is_some() != terminal {
            violations.push(format!(
                "resolvedAt presence does not match status {}",
                self.status
            ));
        }
        if let Some(decision) = &self.final_decision {
            if decision.decision.status() != self.status {
                violations.push("finalDecision disagrees with status".to_string());
            }
            if !decision.automated && self.qualification.is_none() {
                violations.push("reviewer decision recorded without qualification".to_string());
            }
        }
        violations
    }
}
