//! Boundary request and response bodies.
//!
//! These are the shapes exchanged with the surrounding HTTP layer. The
//! qualification request body is [`QualificationInput`](crate::QualificationInput)
//! itself.

use serde::{Deserialize, Serialize};

use crate::error::AdjudicationError;
use crate::types::{CaseId, Decision, ExtractedFile};

/// Result of submitting documents for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub files: Vec<ExtractedFile>,
}

/// Request for a consistency check of a case's documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyRequest {
    pub case_id: CaseId,
    /// Separately supplied narrative statement, compared with the documents.
    #[serde(default)]
    pub statement: Option<String>,
}

/// A reviewer decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub decision: Decision,
    #[serde(default)]
    pub comment: Option<String>,
}

impl DecisionRequest {
    pub fn validate(&self) -> Result<(), AdjudicationError> {
        let has_comment = self.comment.as_deref().is_some_and(|c| !c.trim().is_empty());
        if self.decision == Decision::NeedMoreInfo && !has_comment {
            return Err(AdjudicationError::Validation(
                "NEED_MORE_INFO requires a comment".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_request_wire_format() {
        let request: DecisionRequest =
            serde_json::from_str(r#"{"decision": "NEED_MORE_INFO", "comment": "Brak opinii"}"#).unwrap();
        assert_eq!(request.decision, Decision::NeedMoreInfo);
        assert!(request.validate().is_ok());

        let request: DecisionRequest = serde_json::from_str(r#"{"decision": "ACCEPTED"}"#).unwrap();
        assert!(request.comment.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_need_more_info_without_comment_is_invalid() {
        let request = DecisionRequest {
            decision: Decision::NeedMoreInfo,
            comment: None,
        };
        assert!(matches!(request.validate(), Err(AdjudicationError::Validation(_))));
    }

    #[test]
    fn test_consistency_request_wire_format() {
        let id = CaseId::new();
        let json = format!(r#"{{"caseId": "{}"}}"#, id);
        let request: ConsistencyRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.case_id, id);
        assert!(request.statement.is_none());
    }

    #[test]
    fn test_qualification_request_wire_format() {
        let input: crate::QualificationInput = serde_json::from_value(serde_json::json!({
            "accidentDescription": "Upadek z drabiny",
            "activitiesPerformed": "Montaż oświetlenia",
            "pkdCodes": [{ "code": "43.21.Z", "description": "Wykonywanie instalacji elektrycznych" }],
            "doctorOpinion": { "injuriesMatchDefinition": true }
        }))
        .unwrap();
        assert_eq!(input.pkd_codes.len(), 1);
        assert!(input.doctor_opinion.unwrap().comment.is_none());
    }
}
