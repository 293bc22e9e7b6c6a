//! Error taxonomy shared by the whole pipeline.

use thiserror::Error;

use crate::types::{CaseId, CaseStatus, FailureKind, FileId, PipelineStage};

/// Errors that can occur while adjudicating a case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdjudicationError {
    /// Required input missing; rejected before entering the pipeline.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The oracle call failed or timed out after retries.
    #[error("Oracle call failed during {stage}: {message}")]
    Oracle {
        stage: PipelineStage,
        message: String,
    },

    /// The oracle response is not usable JSON, even after fallback extraction.
    #[error("Oracle response for {stage} could not be parsed: {message}")]
    Parse {
        stage: PipelineStage,
        message: String,
        raw: String,
    },

    /// The qualification response parsed but lacks required structure.
    #[error("Qualification response is malformed: {}", .problems.join("; "))]
    MalformedQualification { problems: Vec<String>, raw: String },

    /// A write collided with another writer on the same case.
    #[error("Case {case_id} was modified concurrently (expected revision {expected}, found {found})")]
    ConcurrentModification {
        case_id: CaseId,
        expected: u64,
        found: u64,
    },

    #[error("Cannot {action} a case in state {from}")]
    InvalidTransition {
        from: CaseStatus,
        action: &'static str,
    },

    #[error("Case {0} has been withdrawn")]
    Withdrawn(CaseId),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AdjudicationError {
    /// Raw oracle response attached to the error, for human diagnosis.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AdjudicationError::Parse { raw, .. }
            | AdjudicationError::MalformedQualification { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Failure category to record on the case, if this error is a stage failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AdjudicationError::Oracle { .. } => Some(FailureKind::Oracle),
            AdjudicationError::Parse { .. } => Some(FailureKind::Parse),
            AdjudicationError::MalformedQualification { .. } => {
                Some(FailureKind::MalformedQualification)
            }
            AdjudicationError::Validation(_) => Some(FailureKind::Validation),
            _ => None,
        }
    }

    pub fn parse(stage: PipelineStage, message: impl Into<String>, raw: impl Into<String>) -> Self {
        AdjudicationError::Parse {
            stage,
            message: message.into(),
            raw: raw.into(),
        }
    }
}

/// A case references files that are not in the file store.
///
/// Never fatal: the missing ids are dropped from the working set and this
/// warning is logged and reported alongside the processing outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[error("Case {case_id} references {} missing file(s): {}", .missing.len(), display_ids(.missing))]
#[serde(rename_all = "camelCase")]
pub struct IntegrityError {
    pub case_id: CaseId,
    pub missing: Vec<FileId>,
}

fn display_ids(ids: &[FileId]) -> String {
    ids.iter().map(FileId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_is_retained() {
        let err = AdjudicationError::parse(PipelineStage::Extraction, "no JSON object", "Dear sir");
        assert_eq!(err.raw_response(), Some("Dear sir"));
        assert_eq!(err.failure_kind(), Some(FailureKind::Parse));
    }

    #[test]
    fn test_concurrent_modification_is_not_a_stage_failure() {
        let err = AdjudicationError::ConcurrentModification {
            case_id: CaseId::new(),
            expected: 1,
            found: 2,
        };
        assert!(err.failure_kind().is_none());
        assert!(err.raw_response().is_none());
    }

    #[test]
    fn test_integrity_error_lists_ids() {
        let warning = IntegrityError {
            case_id: CaseId::new(),
            missing: vec![FileId::from("a"), FileId::from("b")],
        };
        let msg = warning.to_string();
        assert!(msg.contains("2 missing file(s): a, b"));
    }
}
